//! Type definitions for Armory responses and request kinds.

use crate::error::{ArmoryError, Result};
use crate::xml::XmlNode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of search the service understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Item,
    Character,
    Guild,
    ArenaTeam,
}

impl SearchType {
    pub fn all() -> &'static [SearchType] {
        &[
            SearchType::Item,
            SearchType::Character,
            SearchType::Guild,
            SearchType::ArenaTeam,
        ]
    }

    /// Value sent as `searchType`
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Item => "items",
            SearchType::Character => "characters",
            SearchType::Guild => "guilds",
            SearchType::ArenaTeam => "arenateams",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = ArmoryError;

    /// Accepts both the wire names (`characters`) and the singular names (`character`)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "items" | "item" => Ok(SearchType::Item),
            "characters" | "character" => Ok(SearchType::Character),
            "guilds" | "guild" => Ok(SearchType::Guild),
            "arenateams" | "arena_team" | "arenateam" => Ok(SearchType::ArenaTeam),
            _ => Err(ArmoryError::InvalidSearchType {
                search_type: s.to_string(),
            }),
        }
    }
}

/// Discriminator selecting which part of a validated page to extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Search(SearchType),
    CharacterSheet,
    GuildInfo,
    ItemInfo,
    ItemTooltip,
    ArenaTeam,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Search(search_type) => write!(f, "search:{}", search_type),
            ResultKind::CharacterSheet => f.write_str("character_sheet"),
            ResultKind::GuildInfo => f.write_str("guild_info"),
            ResultKind::ItemInfo => f.write_str("item_info"),
            ResultKind::ItemTooltip => f.write_str("item_tooltip"),
            ResultKind::ArenaTeam => f.write_str("arena_team"),
        }
    }
}

impl From<SearchType> for ResultKind {
    fn from(search_type: SearchType) -> Self {
        ResultKind::Search(search_type)
    }
}

/// Valid arena bracket sizes
pub const ARENA_TEAM_SIZES: [u32; 3] = [2, 3, 5];

/// Playable classes by Armory class id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CharacterClass {
    Warrior,
    Paladin,
    Hunter,
    Rogue,
    Priest,
    Shaman,
    Mage,
    Warlock,
    Druid,
}

impl CharacterClass {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Warrior),
            2 => Some(Self::Paladin),
            3 => Some(Self::Hunter),
            4 => Some(Self::Rogue),
            5 => Some(Self::Priest),
            7 => Some(Self::Shaman),
            8 => Some(Self::Mage),
            9 => Some(Self::Warlock),
            11 => Some(Self::Druid),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Warrior => "Warrior",
            Self::Paladin => "Paladin",
            Self::Hunter => "Hunter",
            Self::Rogue => "Rogue",
            Self::Priest => "Priest",
            Self::Shaman => "Shaman",
            Self::Mage => "Mage",
            Self::Warlock => "Warlock",
            Self::Druid => "Druid",
        }
    }
}

/// Playable races by Armory race id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Race {
    Human,
    Orc,
    Dwarf,
    NightElf,
    Undead,
    Tauren,
    Gnome,
    Troll,
    BloodElf,
    Draenei,
}

impl Race {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Human),
            2 => Some(Self::Orc),
            3 => Some(Self::Dwarf),
            4 => Some(Self::NightElf),
            5 => Some(Self::Undead),
            6 => Some(Self::Tauren),
            7 => Some(Self::Gnome),
            8 => Some(Self::Troll),
            10 => Some(Self::BloodElf),
            11 => Some(Self::Draenei),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Orc => "Orc",
            Self::Dwarf => "Dwarf",
            Self::NightElf => "Night Elf",
            Self::Undead => "Undead",
            Self::Tauren => "Tauren",
            Self::Gnome => "Gnome",
            Self::Troll => "Troll",
            Self::BloodElf => "Blood Elf",
            Self::Draenei => "Draenei",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Male),
            1 => Some(Self::Female),
            _ => None,
        }
    }
}

/// Construction of a value model from a validated XML node
pub trait FromXmlNode: Sized {
    fn from_node(node: &XmlNode) -> Result<Self>;
}

/// Models whose XML shape maps one-to-one onto their fields
macro_rules! from_node_via_serde {
    ($($model:ty),* $(,)?) => {
        $(
            impl FromXmlNode for $model {
                fn from_node(node: &XmlNode) -> Result<Self> {
                    node.deserialize()
                }
            }
        )*
    };
}

from_node_via_serde!(Character, Profession, SearchItem, ItemInfo, ItemTooltip);

/// A character as it appears in search results, rosters and character sheets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CharacterAttributes")]
pub struct Character {
    pub name: String,
    pub realm: Option<String>,
    pub level: Option<u32>,
    pub class: Option<CharacterClass>,
    pub race: Option<Race>,
    pub gender: Option<Gender>,
    pub guild: Option<String>,
    pub battle_group: Option<String>,
}

/// Attributes of a `<character>` element as the service sends them
#[derive(Deserialize)]
struct CharacterAttributes {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@realm")]
    realm: Option<String>,
    #[serde(rename = "@level")]
    level: Option<u32>,
    #[serde(rename = "@classId")]
    class_id: Option<u32>,
    #[serde(rename = "@raceId")]
    race_id: Option<u32>,
    #[serde(rename = "@genderId")]
    gender_id: Option<u32>,
    #[serde(rename = "@guildName")]
    guild_name: Option<String>,
    #[serde(rename = "@guild")]
    guild: Option<String>,
    #[serde(rename = "@battleGroup")]
    battle_group: Option<String>,
}

impl From<CharacterAttributes> for Character {
    fn from(attributes: CharacterAttributes) -> Self {
        Self {
            name: attributes.name,
            realm: attributes.realm,
            level: attributes.level,
            class: attributes.class_id.and_then(CharacterClass::from_id),
            race: attributes.race_id.and_then(Race::from_id),
            gender: attributes.gender_id.and_then(Gender::from_id),
            guild: attributes.guild_name.or(attributes.guild),
            battle_group: attributes.battle_group,
        }
    }
}

/// Profession entry on a character sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    #[serde(rename(deserialize = "@name"))]
    pub name: String,
    #[serde(rename(deserialize = "@value"))]
    pub value: Option<u32>,
    #[serde(rename(deserialize = "@max"))]
    pub max: Option<u32>,
}

/// `character-sheet.xml` content
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterSheet {
    pub character: Character,
    pub professions: Vec<Profession>,
}

impl FromXmlNode for CharacterSheet {
    fn from_node(node: &XmlNode) -> Result<Self> {
        let character = node
            .child("character")
            .ok_or_else(|| ArmoryError::extraction(node.name(), "missing <character>"))?;

        let professions = node
            .find("professions")
            .map(|p| {
                p.children_named("skill")
                    .map(Profession::from_node)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            character: Character::from_node(character)?,
            professions,
        })
    }
}

/// A guild from search results or `guild-info.xml`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Guild {
    pub name: String,
    pub realm: Option<String>,
    pub battle_group: Option<String>,
    pub faction: Option<String>,
    pub members: Vec<Character>,
}

#[derive(Deserialize)]
struct GuildAttributes {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@realm")]
    realm: Option<String>,
    #[serde(rename = "@battleGroup")]
    battle_group: Option<String>,
    #[serde(rename = "@faction")]
    faction: Option<String>,
}

impl FromXmlNode for Guild {
    fn from_node(node: &XmlNode) -> Result<Self> {
        // guild-info pages carry the identity on <guildHeader>
        let header: GuildAttributes = node.find("guildHeader").unwrap_or(node).deserialize()?;

        Ok(Self {
            name: header.name,
            realm: header.realm,
            battle_group: header.battle_group,
            faction: header.faction,
            members: members_of(node)?,
        })
    }
}

/// An arena team from search results or `team-info.xml`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArenaTeam {
    pub name: String,
    pub realm: Option<String>,
    pub size: Option<u32>,
    pub rating: Option<u32>,
    pub ranking: Option<u32>,
    pub battle_group: Option<String>,
    pub members: Vec<Character>,
}

#[derive(Deserialize)]
struct ArenaTeamAttributes {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@realm")]
    realm: Option<String>,
    #[serde(rename = "@size")]
    size: Option<u32>,
    #[serde(rename = "@teamSize")]
    team_size: Option<u32>,
    #[serde(rename = "@rating")]
    rating: Option<u32>,
    #[serde(rename = "@ranking")]
    ranking: Option<u32>,
    #[serde(rename = "@battleGroup")]
    battle_group: Option<String>,
}

impl FromXmlNode for ArenaTeam {
    fn from_node(node: &XmlNode) -> Result<Self> {
        let attributes: ArenaTeamAttributes = node.deserialize()?;

        Ok(Self {
            name: attributes.name,
            realm: attributes.realm,
            size: attributes.size.or(attributes.team_size),
            rating: attributes.rating,
            ranking: attributes.ranking,
            battle_group: attributes.battle_group,
            members: members_of(node)?,
        })
    }
}

fn members_of(node: &XmlNode) -> Result<Vec<Character>> {
    match node.find("members") {
        Some(members) => members
            .children_named("character")
            .map(Character::from_node)
            .collect(),
        None => Ok(Vec::new()),
    }
}

/// An item hit from search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchItem {
    #[serde(rename(deserialize = "@id"))]
    pub id: u32,
    #[serde(rename(deserialize = "@name"))]
    pub name: String,
    #[serde(rename(deserialize = "@icon"))]
    pub icon: Option<String>,
    #[serde(rename(deserialize = "@rarity"))]
    pub rarity: Option<u32>,
}

/// `item-info.xml` content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    #[serde(rename(deserialize = "@id"))]
    pub id: u32,
    #[serde(rename(deserialize = "@name"))]
    pub name: String,
    #[serde(rename(deserialize = "@icon"))]
    pub icon: Option<String>,
    #[serde(rename(deserialize = "@quality"))]
    pub quality: Option<u32>,
    #[serde(rename(deserialize = "@level"))]
    pub level: Option<u32>,
}

/// `item-tooltip.xml` content; fields are child elements rather than attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemTooltip {
    pub id: u32,
    pub name: String,
    pub icon: Option<String>,
    #[serde(rename(deserialize = "overallQualityId"))]
    pub quality: Option<u32>,
    #[serde(rename(deserialize = "itemLevel"))]
    pub item_level: Option<u32>,
    #[serde(rename(deserialize = "requiredLevel"))]
    pub required_level: Option<u32>,
}

/// Search results, one variant per search type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "results", rename_all = "snake_case")]
pub enum SearchResults {
    Items(Vec<SearchItem>),
    Characters(Vec<Character>),
    Guilds(Vec<Guild>),
    ArenaTeams(Vec<ArenaTeam>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Items(v) => v.len(),
            SearchResults::Characters(v) => v.len(),
            SearchResults::Guilds(v) => v.len(),
            SearchResults::ArenaTeams(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn node(xml: &str) -> XmlNode {
        parse_document(xml.as_bytes()).unwrap().unwrap()
    }

    #[test]
    fn test_search_type_from_str() {
        assert_eq!("characters".parse::<SearchType>().unwrap(), SearchType::Character);
        assert_eq!("arena_team".parse::<SearchType>().unwrap(), SearchType::ArenaTeam);
        assert!(matches!(
            "all".parse::<SearchType>(),
            Err(ArmoryError::InvalidSearchType { .. })
        ));
    }

    #[test]
    fn test_static_tables() {
        assert_eq!(CharacterClass::from_id(6), None);
        assert_eq!(CharacterClass::from_id(11), Some(CharacterClass::Druid));
        assert_eq!(Race::from_id(1), Some(Race::Human));
        assert_eq!(Race::from_id(2), Some(Race::Orc));
        assert_eq!(Race::from_id(10).map(|r| r.name()), Some("Blood Elf"));
        assert_eq!(Gender::from_id(1), Some(Gender::Female));
    }

    #[test]
    fn test_character_from_node() {
        let character = Character::from_node(&node(
            r#"<character name="Thrall" realm="Draenor" level="70" classId="7" raceId="2" genderId="0" guild="Horde"/>"#,
        ))
        .unwrap();

        assert_eq!(character.name, "Thrall");
        assert_eq!(character.level, Some(70));
        assert_eq!(character.class, Some(CharacterClass::Shaman));
        assert_eq!(character.race, Some(Race::Orc));
        assert_eq!(character.gender, Some(Gender::Male));
        assert_eq!(character.guild.as_deref(), Some("Horde"));
    }

    #[test]
    fn test_character_requires_name() {
        let result = Character::from_node(&node(r#"<character realm="Draenor"/>"#));
        assert!(matches!(result, Err(ArmoryError::Extraction { .. })));
    }

    #[test]
    fn test_guild_uses_header_and_members() {
        let guild = Guild::from_node(&node(
            r#"<guildInfo>
                 <guildHeader name="Exodus" realm="Stormrage" faction="Alliance"/>
                 <guild><members>
                   <character name="A" level="70"/>
                   <character name="B" level="69"/>
                 </members></guild>
               </guildInfo>"#,
        ))
        .unwrap();

        assert_eq!(guild.name, "Exodus");
        assert_eq!(guild.faction.as_deref(), Some("Alliance"));
        assert_eq!(guild.members.len(), 2);
        assert_eq!(guild.members[1].name, "B");
    }

    #[test]
    fn test_item_tooltip_from_children() {
        let tooltip = ItemTooltip::from_node(&node(
            "<itemTooltip><id>12345</id><name>Thunderfury</name><overallQualityId>5</overallQualityId></itemTooltip>",
        ))
        .unwrap();

        assert_eq!(tooltip.id, 12345);
        assert_eq!(tooltip.name, "Thunderfury");
        assert_eq!(tooltip.quality, Some(5));
        assert_eq!(tooltip.item_level, None);

        let missing_id = ItemTooltip::from_node(&node("<itemTooltip><name>x</name></itemTooltip>"));
        assert!(matches!(missing_id, Err(ArmoryError::Extraction { .. })));
    }

    #[test]
    fn test_character_prefers_guild_name() {
        let character = Character::from_node(&node(
            r#"<character name="A" guild="Old" guildName="New" classId="99"/>"#,
        ))
        .unwrap();

        assert_eq!(character.guild.as_deref(), Some("New"));
        assert_eq!(character.class, None);
    }

    #[test]
    fn test_arena_team_size_falls_back_to_team_size() {
        let team = ArenaTeam::from_node(&node(
            r#"<arenaTeam name="Gladiators" teamSize="3" rating="2200"><members><character name="A"/></members></arenaTeam>"#,
        ))
        .unwrap();

        assert_eq!(team.size, Some(3));
        assert_eq!(team.rating, Some(2200));
        assert_eq!(team.members.len(), 1);
    }
}
