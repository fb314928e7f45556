//! Query options, client defaults and the wire query-string encoding.

use crate::types::SearchType;
use std::fmt;

/// Fixed Armory endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Search,
    CharacterSheet,
    CharacterTalents,
    CharacterSkills,
    CharacterReputation,
    GuildInfo,
    ItemInfo,
    ItemTooltip,
    TeamInfo,
}

impl Endpoint {
    /// Path relative to the region base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Search => "search.xml",
            Endpoint::CharacterSheet => "character-sheet.xml",
            Endpoint::CharacterTalents => "character-talents.xml",
            Endpoint::CharacterSkills => "character-skills.xml",
            Endpoint::CharacterReputation => "character-reputation.xml",
            Endpoint::GuildInfo => "guild-info.xml",
            Endpoint::ItemInfo => "item-info.xml",
            Endpoint::ItemTooltip => "item-tooltip.xml",
            Endpoint::TeamInfo => "team-info.xml",
        }
    }

    /// Search results are never served from or written to the cache
    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Endpoint::Search)
    }

    fn default_fields(&self) -> &'static [DefaultField] {
        use DefaultField::*;
        match self {
            Endpoint::Search => &[],
            Endpoint::CharacterSheet
            | Endpoint::CharacterTalents
            | Endpoint::CharacterSkills
            | Endpoint::CharacterReputation => &[CharacterName, Realm],
            Endpoint::GuildInfo => &[GuildName, Realm],
            Endpoint::ItemInfo | Endpoint::ItemTooltip => &[],
            Endpoint::TeamInfo => &[Realm],
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy)]
enum DefaultField {
    CharacterName,
    GuildName,
    Realm,
}

/// Identity defaults captured once when the client is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientDefaults {
    pub character_name: Option<String>,
    pub guild_name: Option<String>,
    pub realm: Option<String>,
    pub locale: Option<String>,
    pub caching: bool,
}

/// Per-call request options. Unset fields are left out of the request entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub character_name: Option<String>,
    pub guild_name: Option<String>,
    pub realm: Option<String>,
    pub search: Option<String>,
    pub search_type: Option<SearchType>,
    pub item_id: Option<u32>,
    pub team_name: Option<String>,
    pub team_size: Option<u32>,
    pub locale: Option<String>,
    pub caching: Option<bool>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character_name(mut self, name: impl Into<String>) -> Self {
        self.character_name = Some(name.into());
        self
    }

    pub fn guild_name(mut self, name: impl Into<String>) -> Self {
        self.guild_name = Some(name.into());
        self
    }

    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = Some(search_type);
        self
    }

    pub fn item_id(mut self, item_id: u32) -> Self {
        self.item_id = Some(item_id);
        self
    }

    pub fn team_name(mut self, name: impl Into<String>) -> Self {
        self.team_name = Some(name.into());
        self
    }

    pub fn team_size(mut self, size: u32) -> Self {
        self.team_size = Some(size);
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn caching(mut self, caching: bool) -> Self {
        self.caching = Some(caching);
        self
    }

    /// Fill unset fields from the client defaults that apply to `endpoint`.
    ///
    /// Fields the caller set always win. Locale falls back for every endpoint;
    /// identity fields only for the endpoints that take them.
    pub fn resolve(mut self, defaults: &ClientDefaults, endpoint: Endpoint) -> Self {
        for field in endpoint.default_fields() {
            match field {
                DefaultField::CharacterName => {
                    fill(&mut self.character_name, &defaults.character_name)
                }
                DefaultField::GuildName => fill(&mut self.guild_name, &defaults.guild_name),
                DefaultField::Realm => fill(&mut self.realm, &defaults.realm),
            }
        }
        fill(&mut self.locale, &defaults.locale);

        self.caching = if endpoint.is_cacheable() {
            Some(self.caching.unwrap_or(defaults.caching))
        } else {
            Some(false)
        };
        self
    }

    /// Whether the resolved options ask for the response cache
    pub fn use_cache(&self) -> bool {
        self.caching.unwrap_or(false)
    }

    fn wire_value(&self, key: WireKey) -> Option<WireValue<'_>> {
        match key {
            WireKey::CharacterName => self.character_name.as_deref().map(WireValue::Text),
            WireKey::Realm => self.realm.as_deref().map(WireValue::Text),
            WireKey::Search => self.search.as_deref().map(WireValue::Text),
            WireKey::SearchType => self.search_type.map(|t| WireValue::Text(t.as_str())),
            WireKey::GuildName => self.guild_name.as_deref().map(WireValue::Text),
            WireKey::ItemId => self.item_id.map(WireValue::Number),
            WireKey::TeamSize => self.team_size.map(WireValue::Number),
            WireKey::TeamName => self.team_name.as_deref().map(WireValue::Text),
        }
    }
}

fn fill(field: &mut Option<String>, default: &Option<String>) {
    if field.is_none() {
        field.clone_from(default);
    }
}

#[derive(Debug, Clone, Copy)]
enum WireKey {
    CharacterName,
    Realm,
    Search,
    SearchType,
    GuildName,
    ItemId,
    TeamSize,
    TeamName,
}

/// Rename table in emission order. Character and guild names share `n`.
const WIRE_KEYS: [(WireKey, &str); 8] = [
    (WireKey::CharacterName, "n"),
    (WireKey::Realm, "r"),
    (WireKey::Search, "searchQuery"),
    (WireKey::SearchType, "searchType"),
    (WireKey::GuildName, "n"),
    (WireKey::ItemId, "i"),
    (WireKey::TeamSize, "ts"),
    (WireKey::TeamName, "t"),
];

enum WireValue<'a> {
    Text(&'a str),
    Number(u32),
}

impl WireValue<'_> {
    fn encode(&self) -> String {
        match self {
            WireValue::Text(text) => url::form_urlencoded::byte_serialize(text.as_bytes()).collect(),
            WireValue::Number(n) => n.to_string(),
        }
    }
}

/// Encoded `key=value` pairs in rename-table order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireQuery {
    pairs: Vec<(&'static str, String)>,
}

impl WireQuery {
    pub fn pairs(&self) -> &[(&'static str, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for WireQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Translate options into the query string the service expects.
///
/// Locale and caching never reach the wire.
pub fn build_wire_query(options: &QueryOptions) -> WireQuery {
    let pairs = WIRE_KEYS
        .iter()
        .filter_map(|(key, wire_name)| {
            options
                .wire_value(*key)
                .map(|value| (*wire_name, value.encode()))
        })
        .collect();

    WireQuery { pairs }
}

/// Full request URL: `base + endpoint + '?' + query`
pub fn build_request_url(base_url: &str, endpoint: Endpoint, query: &WireQuery) -> String {
    if query.is_empty() {
        format!("{}{}", base_url, endpoint.path())
    } else {
        format!("{}{}?{}", base_url, endpoint.path(), query)
    }
}
