use procuro_rust::api::{self, AppState};
use procuro_rust::document::{DocumentExtractor, ExtractionMode, PageRenderer, PdfiumRenderer};
use procuro_rust::llm::{openai::OpenAiClient, LlmClient};
use procuro_rust::{
    create_pool, ensure_schema, AppConfig, CommodityClassifier, MemoryRequestStore, OfferExtractor, OfferIntake,
    PgRequestStore, RequestService, RequestStore,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式, RUST_LOG 未设置时默认 info
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 存储
    let store: Arc<dyn RequestStore> = if config.database.is_memory() {
        warn!("使用内存存储, 重启后数据丢失");
        Arc::new(MemoryRequestStore::new())
    } else {
        let pool = create_pool(&config.database).await?;
        ensure_schema(&pool).await?;
        info!("Database pool created");
        Arc::new(PgRequestStore::new(pool))
    };

    // LLM 客户端
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(&config.llm)?);
    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY 未设置, 提取与分类接口将返回错误");
    }

    // 页面渲染器: 不可用时退回纯文本模式
    let mut default_mode = ExtractionMode::from_flag(config.extraction.use_vision);
    let renderer: Option<Arc<dyn PageRenderer>> = if default_mode == ExtractionMode::Vision {
        match PdfiumRenderer::probe(
            config.extraction.pdfium_library_path.clone(),
            config.extraction.render_dpi,
        ) {
            Ok(renderer) => Some(Arc::new(renderer)),
            Err(e) => {
                error!("pdfium 不可用, 默认改为纯文本提取: {}", e);
                default_mode = ExtractionMode::TextOnly;
                None
            }
        }
    } else {
        None
    };
    info!("默认提取模式: {:?}", default_mode);

    // 创建服务
    let documents = DocumentExtractor::new(renderer, default_mode);
    let extractor = Arc::new(OfferExtractor::new(
        llm.clone(),
        documents,
        config.llm.text_model.clone(),
        config.llm.vision_model.clone(),
    ));
    let classifier = Arc::new(CommodityClassifier::new(llm, config.llm.text_model.clone()));
    let intake = Arc::new(OfferIntake::new(extractor.clone(), classifier.clone()));
    let state = AppState {
        requests: Arc::new(RequestService::new(store)),
        extractor,
        classifier,
        intake,
    };

    let app = api::router(state);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
