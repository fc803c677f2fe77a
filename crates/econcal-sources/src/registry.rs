//! Source name to fetcher lookup.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{SourceError, SourceResult};
use crate::feed::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, JsonFeed, StaticFeed};
use crate::fmp::{self, FmpSource};
use crate::forexfactory::{self, ForexFactorySource};
use crate::raw_record::RawRecord;
use crate::source::EventSource;

/// Source used when none is selected.
pub const DEFAULT_SOURCE: &str = forexfactory::SOURCE_NAME;

/// Everything a factory needs to build a fetcher.
#[derive(Debug, Clone)]
pub struct SourceContext {
    /// Per-request HTTP timeout.
    pub timeout: Duration,
    /// User agent for upstream requests.
    pub user_agent: String,
    /// FMP API key, if configured.
    pub fmp_api_key: Option<String>,
    /// Supplementary ForexFactory export; `None` disables it.
    pub forexfactory_supplementary_url: Option<String>,
    /// Saved upstream payload replacing the network feeds.
    pub replay: Option<Vec<RawRecord>>,
}

impl Default for SourceContext {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fmp_api_key: None,
            forexfactory_supplementary_url: Some(forexfactory::NEXT_WEEK_URL.to_string()),
            replay: None,
        }
    }
}

impl SourceContext {
    /// Builder method to set the FMP API key.
    pub fn with_fmp_api_key(mut self, key: impl Into<String>) -> Self {
        self.fmp_api_key = Some(key.into());
        self
    }

    /// Builder method to replay saved records instead of fetching.
    pub fn with_replay(mut self, records: Vec<RawRecord>) -> Self {
        self.replay = Some(records);
        self
    }

    /// Builder method to set or disable the supplementary ForexFactory feed.
    pub fn with_forexfactory_supplementary(mut self, url: Option<String>) -> Self {
        self.forexfactory_supplementary_url = url;
        self
    }

    fn replay_feed(&self, name: &str) -> Option<StaticFeed> {
        self.replay
            .as_ref()
            .map(|records| StaticFeed::new(format!("{}-replay", name), records.clone()))
    }
}

type Factory = fn(&SourceContext) -> SourceResult<Box<dyn EventSource>>;

/// Immutable registry of fetcher factories.
pub struct SourceRegistry {
    context: SourceContext,
    factories: BTreeMap<&'static str, Factory>,
}

impl SourceRegistry {
    /// Creates a registry with the built-in sources.
    pub fn builtin(context: SourceContext) -> Self {
        let mut factories: BTreeMap<&'static str, Factory> = BTreeMap::new();
        factories.insert(forexfactory::SOURCE_NAME, build_forexfactory);
        factories.insert(fmp::SOURCE_NAME, build_fmp);
        Self { context, factories }
    }

    /// Registered source names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Builds the fetcher registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns an `UnknownSource` error listing the registered names if
    /// `name` is not registered, or the factory's error if the fetcher
    /// cannot be built.
    pub fn get(&self, name: &str) -> SourceResult<Box<dyn EventSource>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| SourceError::unknown_source(name, self.names().as_slice()))?;
        factory(&self.context)
    }
}

fn build_forexfactory(ctx: &SourceContext) -> SourceResult<Box<dyn EventSource>> {
    if let Some(replay) = ctx.replay_feed(forexfactory::SOURCE_NAME) {
        return Ok(Box::new(ForexFactorySource::new(Box::new(replay))));
    }

    let primary = JsonFeed::new(
        "ff-thisweek",
        forexfactory::THIS_WEEK_URL,
        ctx.timeout,
        &ctx.user_agent,
    )?;
    let mut source = ForexFactorySource::new(Box::new(primary));

    if let Some(ref url) = ctx.forexfactory_supplementary_url {
        let feed = JsonFeed::new("ff-supplementary", url, ctx.timeout, &ctx.user_agent)?;
        source = source.with_supplementary(Box::new(feed));
    }
    Ok(Box::new(source))
}

fn build_fmp(ctx: &SourceContext) -> SourceResult<Box<dyn EventSource>> {
    if let Some(replay) = ctx.replay_feed(fmp::SOURCE_NAME) {
        return Ok(Box::new(FmpSource::new(Some(Box::new(replay)))));
    }
    let source = FmpSource::from_api_key(ctx.fmp_api_key.as_deref(), ctx.timeout, &ctx.user_agent)?;
    Ok(Box::new(source))
}
