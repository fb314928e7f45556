//! Armory XML API client implementation.

use crate::cache::{self, CacheStore};
use crate::dispatch::{dispatch_search, dispatch_single};
use crate::error::{ArmoryError, Result};
use crate::query::{build_request_url, build_wire_query, ClientDefaults, Endpoint, QueryOptions};
use crate::region::RegionRouter;
use crate::transport::{RetryPolicy, Transport};
use crate::types::{
    ArenaTeam, CharacterSheet, Guild, ItemInfo, ItemTooltip, ResultKind, SearchResults,
    SearchType, ARENA_TEAM_SIZES,
};
use crate::xml::{self, XmlNode};
use crate::{DEFAULT_CACHE_DIR, DEFAULT_EU_BASE_URL, DEFAULT_US_BASE_URL, DEFAULT_USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for the Armory client
#[derive(Debug, Clone)]
pub struct ArmoryClientConfig {
    /// Base URL of the US Armory, with trailing slash
    pub us_base_url: String,
    /// Base URL of the EU Armory, with trailing slash
    pub eu_base_url: String,
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Request timeout in seconds, per attempt
    pub timeout_seconds: u64,
    /// Maximum number of automatic retry attempts on network errors
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub retry_backoff_ms: u64,
    /// Root directory of the response cache
    pub cache_dir: PathBuf,
    /// Fail the call when a fetched response cannot be written to the cache
    pub strict_cache_writes: bool,
}

impl Default for ArmoryClientConfig {
    fn default() -> Self {
        Self {
            us_base_url: DEFAULT_US_BASE_URL.to_string(),
            eu_base_url: DEFAULT_EU_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 30,
            max_retries: 0,
            retry_backoff_ms: 500,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            strict_cache_writes: false,
        }
    }
}

/// Main Armory XML API client
#[derive(Debug, Clone)]
pub struct ArmoryClient {
    /// Identity defaults applied to every call
    defaults: ClientDefaults,
    /// Region base URLs
    router: RegionRouter,
    /// Cache in front of the HTTP transport
    cache: CacheStore,
}

impl ArmoryClient {
    /// Create a new Armory client with default configuration
    pub fn new(defaults: ClientDefaults) -> Result<Self> {
        Self::with_config(defaults, ArmoryClientConfig::default())
    }

    /// Create a new Armory client with custom configuration
    pub fn with_config(defaults: ClientDefaults, config: ArmoryClientConfig) -> Result<Self> {
        // Validate the hosts once so every later URL is well-formed
        url::Url::parse(&config.us_base_url)?;
        url::Url::parse(&config.eu_base_url)?;

        let transport = Transport::new(
            &config.user_agent,
            Duration::from_secs(config.timeout_seconds),
            RetryPolicy {
                max_retries: config.max_retries,
                backoff_base_ms: config.retry_backoff_ms,
            },
        )?;
        let router = RegionRouter::new(config.us_base_url, config.eu_base_url);
        let cache = CacheStore::new(
            config.cache_dir,
            router.clone(),
            transport,
            config.strict_cache_writes,
        );

        Ok(Self {
            defaults,
            router,
            cache,
        })
    }

    /// Defaults captured at construction
    pub fn defaults(&self) -> &ClientDefaults {
        &self.defaults
    }

    /// Root directory of the response cache
    pub fn cache_dir(&self) -> &Path {
        self.cache.root()
    }

    /// Build the request URL for already-resolved options
    pub fn build_url(&self, endpoint: Endpoint, options: &QueryOptions) -> String {
        let base = self.router.base_host(options.locale.as_deref());
        build_request_url(base, endpoint, &build_wire_query(options))
    }

    /// Run the request pipeline for `endpoint` and return the validated page.
    ///
    /// `Ok(None)` means the service answered without a page and without an error code.
    pub async fn fetch_raw(
        &self,
        endpoint: Endpoint,
        options: QueryOptions,
    ) -> Result<Option<XmlNode>> {
        let options = options.resolve(&self.defaults, endpoint);
        let url = self.build_url(endpoint, &options);
        debug!("Requesting {} (cache: {})", url, options.use_cache());

        let body = self.cache.fetch(&url, options.use_cache()).await?;
        xml::validate(&body)
    }

    async fn fetch_page(&self, endpoint: Endpoint, options: QueryOptions) -> Result<XmlNode> {
        self.fetch_raw(endpoint, options)
            .await?
            .ok_or_else(|| ArmoryError::missing_content(endpoint.path()))
    }

    /// General-purpose search; every typed search is a wrapper around this.
    /// Search results are never cached.
    pub async fn search(&self, search: &str, search_type: SearchType) -> Result<SearchResults> {
        self.search_with(QueryOptions::new().search(search).search_type(search_type))
            .await
    }

    /// Search with full control over the request options
    pub async fn search_with(&self, options: QueryOptions) -> Result<SearchResults> {
        let search_type = options
            .search_type
            .ok_or_else(|| ArmoryError::InvalidSearchType {
                search_type: "<none>".to_string(),
            })?;
        if options.search.as_deref().map_or(true, |s| s.trim().is_empty()) {
            return Err(ArmoryError::NoSearchString);
        }

        debug!("Searching {} for {:?}", search_type, options.search);
        let results = match self.fetch_raw(Endpoint::Search, options).await? {
            Some(page) => dispatch_search(&page, ResultKind::Search(search_type))?,
            None => dispatch_search(&XmlNode::default(), ResultKind::Search(search_type))?,
        };

        info!("Search for {} returned {} results", search_type, results.len());
        Ok(results)
    }

    /// Search characters across all realms
    pub async fn search_characters(&self, name: &str) -> Result<SearchResults> {
        self.search(name, SearchType::Character).await
    }

    /// Search guilds across all realms
    pub async fn search_guilds(&self, name: &str) -> Result<SearchResults> {
        self.search(name, SearchType::Guild).await
    }

    /// Search items; items are not realm-specific
    pub async fn search_items(&self, name: &str) -> Result<SearchResults> {
        self.search(name, SearchType::Item).await
    }

    pub async fn search_arena_teams(&self, name: &str) -> Result<SearchResults> {
        self.search(name, SearchType::ArenaTeam).await
    }

    /// Fetch a character sheet. Name and realm fall back to the client defaults.
    pub async fn get_character_sheet(&self, options: QueryOptions) -> Result<CharacterSheet> {
        let page = self.fetch_page(Endpoint::CharacterSheet, options).await?;
        let sheet: CharacterSheet = dispatch_single(&page, ResultKind::CharacterSheet)?
            .ok_or_else(|| ArmoryError::missing_content(Endpoint::CharacterSheet.path()))?;

        info!("Fetched character sheet for {}", sheet.character.name);
        Ok(sheet)
    }

    /// Raw `character-talents.xml` page
    pub async fn get_character_talents(&self, options: QueryOptions) -> Result<XmlNode> {
        self.fetch_page(Endpoint::CharacterTalents, options).await
    }

    /// Raw `character-skills.xml` page
    pub async fn get_character_skills(&self, options: QueryOptions) -> Result<XmlNode> {
        self.fetch_page(Endpoint::CharacterSkills, options).await
    }

    /// Raw `character-reputation.xml` page
    pub async fn get_character_reputation(&self, options: QueryOptions) -> Result<XmlNode> {
        self.fetch_page(Endpoint::CharacterReputation, options).await
    }

    /// Fetch guild info. Guild name and realm fall back to the client defaults.
    pub async fn get_guild(&self, options: QueryOptions) -> Result<Guild> {
        let page = self.fetch_page(Endpoint::GuildInfo, options).await?;
        let guild: Guild = dispatch_single(&page, ResultKind::GuildInfo)?
            .ok_or_else(|| ArmoryError::missing_content(Endpoint::GuildInfo.path()))?;

        info!("Fetched guild {} with {} members", guild.name, guild.members.len());
        Ok(guild)
    }

    /// Fetch item info; `None` when the service has no such item
    pub async fn get_item_info(&self, options: QueryOptions) -> Result<Option<ItemInfo>> {
        match self.fetch_raw(Endpoint::ItemInfo, options).await? {
            Some(page) => dispatch_single(&page, ResultKind::ItemInfo),
            None => Ok(None),
        }
    }

    /// Fetch an item tooltip; the service answers unknown items with an empty document
    pub async fn get_item_tooltip(&self, options: QueryOptions) -> Result<Option<ItemTooltip>> {
        let item_id = options.item_id;
        match self.fetch_raw(Endpoint::ItemTooltip, options).await? {
            Some(page) => dispatch_single(&page, ResultKind::ItemTooltip),
            None => {
                debug!("Empty tooltip document for item {:?}", item_id);
                Ok(None)
            }
        }
    }

    /// Fetch an arena team. The team size is checked before any request is made.
    pub async fn get_arena_team(&self, options: QueryOptions) -> Result<ArenaTeam> {
        match options.team_size {
            Some(size) if ARENA_TEAM_SIZES.contains(&size) => {}
            other => {
                return Err(ArmoryError::InvalidArenaTeamSize {
                    size: other.unwrap_or(0),
                })
            }
        }

        let page = self.fetch_page(Endpoint::TeamInfo, options).await?;
        let team: ArenaTeam = dispatch_single(&page, ResultKind::ArenaTeam)?
            .ok_or_else(|| ArmoryError::missing_content(Endpoint::TeamInfo.path()))?;

        info!("Fetched arena team {}", team.name);
        Ok(team)
    }

    /// Remove the cache directory, or `path` when given. Missing directories are ignored.
    pub async fn clear_cache(&self, path: Option<&Path>) -> Result<()> {
        cache::clear_cache(path.unwrap_or_else(|| self.cache.root())).await
    }
}
