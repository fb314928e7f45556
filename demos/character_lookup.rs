//! Character lookup example for the Armory library.
//!
//! This example demonstrates how to:
//! - Create an Armory client with default realm and locale
//! - Fetch a character sheet, optionally through the response cache
//! - Handle service error codes gracefully
//!
//! Usage:
//! ```
//! ARMORY_REALM=Draenor ARMORY_LOCALE=eu cargo run --example character_lookup -- Thrall
//! ```

use armory_xml::{ArmoryClient, ArmoryError, ClientDefaults, QueryOptions, SearchResults};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <character>", args[0]);
        eprintln!("Example: {} Thrall", args[0]);
        std::process::exit(1);
    }
    let name = &args[1];

    let client = ArmoryClient::new(ClientDefaults {
        realm: env::var("ARMORY_REALM").ok(),
        locale: env::var("ARMORY_LOCALE").ok(),
        caching: env::var("ARMORY_CACHE").is_ok(),
        ..Default::default()
    })?;

    println!("Looking up character: {}", name);
    match client
        .get_character_sheet(QueryOptions::new().character_name(name.as_str()))
        .await
    {
        Ok(sheet) => {
            let character = &sheet.character;
            println!("\n=== Character Sheet ===");
            println!("Name: {}", character.name);
            if let Some(realm) = &character.realm {
                println!("Realm: {}", realm);
            }
            if let Some(level) = character.level {
                println!("Level: {}", level);
            }
            if let (Some(race), Some(class)) = (character.race, character.class) {
                println!("{} {}", race.name(), class.name());
            }
            if let Some(guild) = &character.guild {
                println!("Guild: <{}>", guild);
            }
            for profession in &sheet.professions {
                println!(
                    "Profession: {} {}/{}",
                    profession.name,
                    profession.value.unwrap_or_default(),
                    profession.max.unwrap_or_default()
                );
            }
        }
        Err(ArmoryError::CharacterNotFound) => {
            println!("No such character, searching instead...");
            if let SearchResults::Characters(found) = client.search_characters(name).await? {
                for character in found {
                    println!(
                        "  {} ({})",
                        character.name,
                        character.realm.unwrap_or_default()
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("Lookup failed: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
