use crate::gemini::GenerativeContentService;
use crate::wisdom::{cache, WisdomCache, WisdomError, WisdomRecord};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const LOG_TARGET: &str = "dharma_daily::wisdom::loader";

/// Progress of loading the day's teaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingState {
    Idle,
    Loading,
    Success,
    Error,
}

/// Loads the day's teaching from the cache or the generative service.
pub struct ContentLoader {
    service: Arc<dyn GenerativeContentService>,
    cache: WisdomCache,
    state: LoadingState,
    current: Option<Arc<WisdomRecord>>,
}

impl ContentLoader {
    pub fn new(service: Arc<dyn GenerativeContentService>, cache: WisdomCache) -> Self {
        Self {
            service,
            cache,
            state: LoadingState::Idle,
            current: None,
        }
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    /// The teaching from the last successful load.
    pub fn current(&self) -> Option<Arc<WisdomRecord>> {
        self.current.clone()
    }

    /// Loads today's teaching. See [`ContentLoader::load_on`].
    pub async fn load(&mut self, force_new: bool) -> Result<Arc<WisdomRecord>, WisdomError> {
        self.load_on(&cache::today(), force_new).await
    }

    /// Loads the teaching for `date`.
    ///
    /// Unless `force_new` is set, a record cached on the same date is reused.
    /// Otherwise one generation request is made; a forced refresh asks the
    /// service to avoid the term currently shown.
    #[instrument(skip(self))]
    pub async fn load_on(&mut self, date: &str, force_new: bool) -> Result<Arc<WisdomRecord>, WisdomError> {
        self.state = LoadingState::Loading;

        if !force_new {
            if let Some(record) = self.cache.load_for(date) {
                info!(target: LOG_TARGET, "Using cached teaching '{}' for {}", record.term, date);
                let record = Arc::new(record);
                self.current = Some(Arc::clone(&record));
                self.state = LoadingState::Success;
                return Ok(record);
            }
        }

        let exclude: Vec<String> = if force_new {
            self.current.iter().map(|record| record.term.clone()).collect()
        } else {
            Vec::new()
        };

        match self.service.generate_wisdom(&exclude).await {
            Ok(record) => {
                if let Err(e) = self.cache.store(date, &record) {
                    warn!(target: LOG_TARGET, "Failed to cache teaching: {}", e);
                }
                let record = Arc::new(record);
                self.current = Some(Arc::clone(&record));
                self.state = LoadingState::Success;
                Ok(record)
            }
            Err(e) => {
                error!(target: LOG_TARGET, "Failed to load teaching: {}", e);
                self.state = LoadingState::Error;
                Err(WisdomError::from(e))
            }
        }
    }
}
