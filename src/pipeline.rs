use crate::config::{Capabilities, ConfigError, ServiceConfig};
use crate::error::AnalysisError;
use crate::fetchers::{HttpFetcher, PageFetcher, check_robots};
use crate::parsers::html;
use crate::parsers::signatures::{self, SignatureRegistry};
use crate::results::Analysis;
use crate::sink::{self, AnalysisSink};
use crate::target::PageTarget;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Runs robots check, fetch, extraction and detection for one page at a time.
///
/// Holds no per-request state, so one instance can be cloned into every task.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn AnalysisSink>,
    registry: Arc<SignatureRegistry>,
    robots_timeout: Duration,
    page_timeout: Duration,
}

impl Pipeline {
    /// Create a pipeline with HTTP fetching and the sink the capabilities call for
    pub fn new(
        config: &ServiceConfig,
        capabilities: &Capabilities,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            fetcher: Arc::new(HttpFetcher::new(&config.user_agent)?),
            sink: sink::sink_for(&capabilities.persistence)?,
            registry: Arc::new(SignatureRegistry::builtin()),
            robots_timeout: config.robots_timeout(),
            page_timeout: config.page_timeout(),
        })
    }

    /// Replace the fetcher used for both robots and page requests
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replace the persistence sink
    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the signature registry
    pub fn with_registry(mut self, registry: Arc<SignatureRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the robots and page fetch timeouts
    pub fn with_timeouts(mut self, robots: Duration, page: Duration) -> Self {
        self.robots_timeout = robots;
        self.page_timeout = page;
        self
    }

    /// Analyze a single page.
    ///
    /// The page is only fetched when the robots policy allows it. The finished
    /// analysis is handed to the sink on a detached task; a failed store is
    /// logged and never delays or affects the result. Dropping this future
    /// before assembly stores nothing.
    pub async fn analyze(&self, raw_url: &str) -> Result<Analysis, AnalysisError> {
        let target = PageTarget::parse(raw_url)?;
        ::log::info!("Analyzing {}", target);

        let decision = check_robots(self.fetcher.as_ref(), &target, self.robots_timeout).await;
        if !decision.allowed {
            ::log::info!("Robots policy disallows {}", target);
            return Err(AnalysisError::DisallowedByRobots {
                url: target.to_string(),
            });
        }

        let page = self
            .fetcher
            .fetch(target.as_str(), self.page_timeout)
            .await
            .map_err(|e| AnalysisError::FetchFailed {
                url: target.to_string(),
                reason: e.to_string(),
            })?;

        if !page.is_success() {
            return Err(AnalysisError::FetchFailed {
                url: target.to_string(),
                reason: format!("status {}", page.status),
            });
        }

        let extraction = html::extract(&page.body);
        let detection = signatures::detect(&self.registry, &page.body);
        let analysis = Analysis::assemble(
            raw_url.trim().to_string(),
            extraction,
            detection,
            Utc::now(),
        );

        ::log::info!(
            "Analyzed {}: {} blocks, {} plugins, {} bridge findings",
            target,
            analysis.blocks().len(),
            analysis.plugin_signatures().len(),
            analysis.bridge_findings().len()
        );

        self.mirror(&analysis);

        Ok(analysis)
    }

    /// Hands a copy of the analysis to the sink without waiting on it
    fn mirror(&self, analysis: &Analysis) {
        let sink = Arc::clone(&self.sink);
        let analysis = analysis.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.store(&analysis).await {
                ::log::warn!("Failed to store analysis of {}: {}", analysis.url(), e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::{FetchError, FetchedPage};
    use crate::parsers::signatures::SignatureEntry;
    use crate::results::PluginSignature;
    use crate::sink::{NoopSink, SinkError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned responses and records every requested URL
    #[derive(Default)]
    struct ScriptedFetcher {
        responses: HashMap<String, (u16, String)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedFetcher {
        fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), (status, body.to_string()));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn call_count(&self, url: &str) -> usize {
            self.calls().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some((status, body)) => Ok(FetchedPage {
                    url: url.to_string(),
                    status: *status,
                    body: body.clone(),
                }),
                None => Err(FetchError::Timeout(timeout)),
            }
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        stored: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        /// Stored URLs once detached stores have had a chance to run
        async fn settled(&self) -> Vec<String> {
            for _ in 0..50 {
                if !self.stored.lock().unwrap().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            self.stored.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalysisSink for RecordingSink {
        async fn store(&self, analysis: &Analysis) -> Result<(), SinkError> {
            self.stored.lock().unwrap().push(analysis.url().to_string());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl AnalysisSink for FailingSink {
        async fn store(&self, _analysis: &Analysis) -> Result<(), SinkError> {
            Err(SinkError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    const PAGE_URL: &str = "https://example.com/";
    const ROBOTS_URL: &str = "https://example.com/robots.txt";
    const PAGE: &str = "<html><head><title>Example</title></head>\
        <body><h1>Hello</h1><div class=\"elementor\">Body</div></body></html>";

    fn pipeline(fetcher: Arc<ScriptedFetcher>, sink: Arc<dyn AnalysisSink>) -> Pipeline {
        Pipeline::new(&ServiceConfig::default(), &Capabilities::disabled())
            .unwrap()
            .with_fetcher(fetcher)
            .with_sink(sink)
    }

    #[tokio::test]
    async fn test_analyze_assembles_analysis() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .with(ROBOTS_URL, 200, "User-agent: *\nDisallow: /private")
                .with(PAGE_URL, 200, PAGE),
        );
        let sink = Arc::new(RecordingSink::default());

        let analysis = pipeline(fetcher.clone(), sink.clone())
            .analyze(PAGE_URL)
            .await
            .unwrap();

        assert_eq!(analysis.url(), PAGE_URL);
        assert_eq!(analysis.title(), "Example");
        assert_eq!(analysis.headings()[0].text, "Hello");
        assert_eq!(analysis.blocks().len(), 2);
        assert_eq!(analysis.plugin_signatures()[0].slug, "elementor");
        // Robots first, then the page
        assert_eq!(fetcher.calls(), vec![ROBOTS_URL, PAGE_URL]);
        assert_eq!(sink.settled().await, vec![PAGE_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_robots_disallow_never_fetches_page() {
        let fetcher = Arc::new(
            ScriptedFetcher::default()
                .with(ROBOTS_URL, 200, "Disallow: /")
                .with(PAGE_URL, 200, PAGE),
        );
        let sink = Arc::new(RecordingSink::default());

        let err = pipeline(fetcher.clone(), sink.clone())
            .analyze(PAGE_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::DisallowedByRobots { .. }));
        assert_eq!(err.code(), "disallowed_by_robots");
        assert_eq!(fetcher.call_count(PAGE_URL), 0);
        assert_eq!(fetcher.call_count(ROBOTS_URL), 1);
        assert!(sink.settled().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_robots_fails_open() {
        let fetcher = Arc::new(ScriptedFetcher::default().with(PAGE_URL, 200, PAGE));

        let analysis = pipeline(fetcher.clone(), Arc::new(NoopSink))
            .analyze(PAGE_URL)
            .await
            .unwrap();

        assert_eq!(analysis.title(), "Example");
        assert_eq!(fetcher.call_count(PAGE_URL), 1);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_urls_skip_network() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let pipeline = pipeline(fetcher.clone(), Arc::new(NoopSink));

        let err = pipeline.analyze("").await.unwrap_err();
        assert_eq!(err.code(), "missing_url");

        let err = pipeline.analyze("ftp://example.com/").await.unwrap_err();
        assert_eq!(err.code(), "invalid_url");

        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_errors_are_upstream_failures() {
        // Page not scripted: the fetcher times out
        let fetcher = Arc::new(ScriptedFetcher::default().with(ROBOTS_URL, 404, ""));
        let err = pipeline(fetcher, Arc::new(NoopSink))
            .analyze(PAGE_URL)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "fetch_failed");

        let fetcher = Arc::new(ScriptedFetcher::default().with(PAGE_URL, 500, "oops"));
        let err = pipeline(fetcher, Arc::new(NoopSink))
            .analyze(PAGE_URL)
            .await
            .unwrap_err();
        match err {
            AnalysisError::FetchFailed { reason, .. } => assert_eq!(reason, "status 500"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Answers robots immediately and never answers the page
    struct StalledFetcher;

    #[async_trait]
    impl PageFetcher for StalledFetcher {
        async fn fetch(&self, url: &str, _timeout: Duration) -> Result<FetchedPage, FetchError> {
            if url == ROBOTS_URL {
                return Ok(FetchedPage {
                    url: url.to_string(),
                    status: 404,
                    body: String::new(),
                });
            }
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_dropped_analysis_stores_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let pipeline = Pipeline::new(&ServiceConfig::default(), &Capabilities::disabled())
            .unwrap()
            .with_fetcher(Arc::new(StalledFetcher))
            .with_sink(sink.clone());

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), pipeline.analyze(PAGE_URL)).await;
        assert!(outcome.is_err());
        assert!(sink.settled().await.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_fetch_stores_nothing() {
        // Page not scripted: the fetcher times out
        let fetcher = Arc::new(ScriptedFetcher::default());
        let sink = Arc::new(RecordingSink::default());
        let err = pipeline(fetcher, sink.clone())
            .analyze(PAGE_URL)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "fetch_failed");
        assert!(sink.settled().await.is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_fail_analysis() {
        let fetcher = Arc::new(ScriptedFetcher::default().with(PAGE_URL, 200, PAGE));
        let result = pipeline(fetcher, Arc::new(FailingSink))
            .analyze(PAGE_URL)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_injected_registry() {
        let registry = SignatureRegistry::new(
            vec![SignatureEntry {
                token: "hello".to_string(),
                plugin: PluginSignature::new("hello", "Hello Plugin", "Tester"),
            }],
            Vec::new(),
        );
        let fetcher = Arc::new(ScriptedFetcher::default().with(PAGE_URL, 200, PAGE));
        let analysis = pipeline(fetcher, Arc::new(NoopSink))
            .with_registry(Arc::new(registry))
            .analyze(PAGE_URL)
            .await
            .unwrap();

        let slugs: Vec<_> = analysis
            .plugin_signatures()
            .iter()
            .map(|p| p.slug.as_str())
            .collect();
        assert_eq!(slugs, vec!["hello"]);
    }
}
