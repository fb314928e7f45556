//! Selection of the XML sub-structure for each result kind.

use crate::error::{ArmoryError, Result};
use crate::types::{
    ArenaTeam, Character, FromXmlNode, Guild, ResultKind, SearchItem, SearchResults, SearchType,
};
use crate::xml::XmlNode;

const SEARCH_RESULTS_PATH: [&str; 2] = ["armorySearch", "searchResults"];

/// Collection element and entry element for each search type
fn search_collection(search_type: SearchType) -> (&'static str, &'static str) {
    match search_type {
        SearchType::Item => ("items", "item"),
        SearchType::Character => ("characters", "character"),
        SearchType::Guild => ("guilds", "guild"),
        SearchType::ArenaTeam => ("arenaTeams", "arenaTeam"),
    }
}

/// Build one value per entry of a collection, in document order.
/// A missing collection is an empty result.
fn collect<T: FromXmlNode>(page: &XmlNode, search_type: SearchType) -> Result<Vec<T>> {
    let (collection, entry) = search_collection(search_type);

    let Some(node) = page
        .path(&SEARCH_RESULTS_PATH)
        .and_then(|results| results.child(collection))
    else {
        return Ok(Vec::new());
    };

    node.children_named(entry).map(T::from_node).collect()
}

/// Extract every result of a search page
pub fn dispatch_search(page: &XmlNode, kind: ResultKind) -> Result<SearchResults> {
    let ResultKind::Search(search_type) = kind else {
        return Err(ArmoryError::InvalidResultKind {
            kind: kind.to_string(),
        });
    };

    Ok(match search_type {
        SearchType::Item => SearchResults::Items(collect::<SearchItem>(page, search_type)?),
        SearchType::Character => {
            SearchResults::Characters(collect::<Character>(page, search_type)?)
        }
        SearchType::Guild => SearchResults::Guilds(collect::<Guild>(page, search_type)?),
        SearchType::ArenaTeam => {
            SearchResults::ArenaTeams(collect::<ArenaTeam>(page, search_type)?)
        }
    })
}

/// Locate the node holding a single-result kind
pub fn single_node(page: &XmlNode, kind: ResultKind) -> Result<Option<&XmlNode>> {
    let node = match kind {
        ResultKind::CharacterSheet => page.find("characterInfo"),
        ResultKind::GuildInfo => page.find("guildInfo"),
        ResultKind::ItemInfo => page.find("itemInfo").and_then(|info| info.child("item")),
        ResultKind::ItemTooltip => page.find("itemTooltip"),
        ResultKind::ArenaTeam => page.find("arenaTeam"),
        ResultKind::Search(_) => {
            return Err(ArmoryError::InvalidResultKind {
                kind: kind.to_string(),
            })
        }
    };
    Ok(node)
}

/// Build the single value for `kind`, or `None` when its node is absent
pub fn dispatch_single<T: FromXmlNode>(page: &XmlNode, kind: ResultKind) -> Result<Option<T>> {
    single_node(page, kind)?.map(T::from_node).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemInfo;
    use crate::xml::validate;

    fn validated(xml: &str) -> XmlNode {
        validate(xml.as_bytes()).unwrap().unwrap()
    }

    #[test]
    fn test_dispatch_search_document_order() {
        let page = validated(
            r#"<page><armorySearch><searchResults><guilds>
                 <guild name="First" realm="A"/>
                 <guild name="Second" realm="B"/>
               </guilds></searchResults></armorySearch></page>"#,
        );

        match dispatch_search(&page, SearchType::Guild.into()).unwrap() {
            SearchResults::Guilds(guilds) => {
                let names: Vec<_> = guilds.iter().map(|g| g.name.as_str()).collect();
                assert_eq!(names, vec!["First", "Second"]);
            }
            other => panic!("unexpected results: {other:?}"),
        }
    }

    #[test]
    fn test_dispatch_search_missing_collection_is_empty() {
        let page = validated("<page><armorySearch/></page>");
        let results = dispatch_search(&page, SearchType::ArenaTeam.into()).unwrap();
        assert_eq!(results, SearchResults::ArenaTeams(Vec::new()));
    }

    #[test]
    fn test_dispatch_search_rejects_single_kind() {
        let page = validated("<page/>");
        assert!(matches!(
            dispatch_search(&page, ResultKind::GuildInfo),
            Err(ArmoryError::InvalidResultKind { .. })
        ));
        assert!(matches!(
            dispatch_single::<Guild>(&page, SearchType::Guild.into()),
            Err(ArmoryError::InvalidResultKind { .. })
        ));
    }

    #[test]
    fn test_dispatch_single() {
        let page = validated(r#"<page><itemInfo><item id="7" name="Sword"/></itemInfo></page>"#);
        let item = dispatch_single::<ItemInfo>(&page, ResultKind::ItemInfo)
            .unwrap()
            .unwrap();
        assert_eq!(item.id, 7);

        let empty = validated("<page><itemInfo/></page>");
        assert_eq!(
            dispatch_single::<ItemInfo>(&empty, ResultKind::ItemInfo).unwrap(),
            None
        );
    }
}
