//! HTTP backends for the verdict engine

pub mod embedding;
pub mod syntax;

pub use embedding::{create_embedder, OllamaEmbedder, OpenAIEmbedder};
pub use syntax::HttpSyntaxAnalyzer;

use std::sync::Arc;

use verdict::{DependencyExtractor, Extractor, IdentityExtractor, VerdictEngine};

use crate::config::Config;

/// Assemble a verdict engine from the embedding and syntax settings.
///
/// With the parse service disabled, assertion mode degrades to comparing
/// lowercased full texts.
pub fn build_engine(config: &Config) -> VerdictEngine {
    let embedder = create_embedder(&config.embedding);
    let extractor: Arc<dyn Extractor> = if config.syntax.enabled {
        Arc::new(DependencyExtractor::new(Arc::new(
            HttpSyntaxAnalyzer::from_config(&config.syntax),
        )))
    } else {
        Arc::new(IdentityExtractor)
    };

    VerdictEngine::new(embedder, extractor).with_thresholds(config.evaluation.thresholds)
}


#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `app` on an ephemeral port and return its base URL
    pub(crate) async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
