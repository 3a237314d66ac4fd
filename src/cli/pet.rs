//! Pet commands

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use chrono::Utc;

use super::{parse_id, progress_bar, short_id, Session};
use stepquest::progression::pets::{AccessoryCategory, AccessoryId, Pet, PetKind, ACCESSORIES};

fn parse_pet_kind(raw: &str) -> Result<PetKind> {
    PetKind::from_str(&raw.trim().to_lowercase()).ok_or_else(|| {
        let names: Vec<&str> = PetKind::all().iter().map(|k| k.as_str()).collect();
        anyhow!("Unknown pet kind '{raw}'. Available: {}", names.join(", "))
    })
}

fn parse_accessory(raw: &str) -> Result<AccessoryId> {
    AccessoryId::from_str(&raw.trim().replace('-', "_"))
        .ok_or_else(|| anyhow!("Unknown accessory '{raw}'"))
}

fn print_pet(pet: &Pet, active: bool) {
    let marker = if active { "*" } else { " " };
    println!(
        "{marker} {} {} the {} - {} {} {} XP",
        short_id(&pet.id),
        pet.name,
        pet.kind.display_name(),
        pet.stage(),
        progress_bar(pet.stage_progress(), 10),
        pet.total_xp
    );
    if let Some(left) = pet.xp_to_next_stage() {
        println!("    {left} XP to next stage, {} days old", pet.days_old(Utc::now()));
    }
    if !pet.equipped.is_empty() {
        let worn: Vec<String> = pet.equipped.values().map(|id| id.def().name.to_string()).collect();
        println!("    wearing: {}", worn.join(", "));
    }
}

pub async fn pet_list_command(config_override: Option<&PathBuf>, premium: bool) -> Result<()> {
    let session = Session::open(config_override, premium)?;
    let snapshot = session.handle.snapshot();
    let roster = &snapshot.state.pets;

    if roster.pets.is_empty() {
        println!("No pets yet. Adopt one with `stepquest pet create <name>`.");
    }
    for pet in &roster.pets {
        print_pet(pet, roster.active == Some(pet.id));
    }

    if let Some(pet) = roster.active_pet() {
        println!("\nAccessories for {}:", pet.name);
        for accessory in ACCESSORIES {
            let state = if pet.equipped.get(&accessory.category) == Some(&accessory.id) {
                "equipped"
            } else if pet.unlocked_accessories.contains(&accessory.id) {
                "unlocked"
            } else {
                "locked"
            };
            let premium = if accessory.is_premium { ", premium" } else { "" };
            println!(
                "  {} {} [{}] {} XP{premium} - {state}",
                accessory.icon,
                accessory.id,
                accessory.category.as_str(),
                accessory.unlock_xp
            );
        }
    }

    session.close().await
}

pub async fn pet_create_command(config_override: Option<&PathBuf>, premium: bool, name: &str, kind: &str) -> Result<()> {
    let kind = parse_pet_kind(kind)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.create_pet(name, kind).await;
    session.close().await?;

    let pet = result?;
    println!("Adopted {} the {} ({})", pet.name, pet.kind.display_name(), pet.id);
    Ok(())
}

pub async fn pet_select_command(config_override: Option<&PathBuf>, premium: bool, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.select_pet(id).await;
    session.close().await?;

    result?;
    println!("Selected pet {id}");
    Ok(())
}

pub async fn pet_rename_command(config_override: Option<&PathBuf>, premium: bool, id: &str, name: &str) -> Result<()> {
    let id = parse_id(id)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.rename_pet(id, name).await;
    session.close().await?;

    result?;
    println!("Renamed pet {id} to {}", name.trim());
    Ok(())
}

pub async fn pet_delete_command(config_override: Option<&PathBuf>, premium: bool, id: &str) -> Result<()> {
    let id = parse_id(id)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.delete_pet(id).await;
    session.close().await?;

    let pet = result?;
    println!("Said goodbye to {}", pet.name);
    Ok(())
}

pub async fn pet_equip_command(config_override: Option<&PathBuf>, premium: bool, accessory: &str) -> Result<()> {
    let accessory = parse_accessory(accessory)?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.equip_accessory(accessory).await;
    session.close().await?;

    result?;
    println!("Equipped {}", accessory.def().name);
    Ok(())
}

pub async fn pet_unequip_command(config_override: Option<&PathBuf>, premium: bool, category: &str) -> Result<()> {
    let category = AccessoryCategory::from_str(category.trim())
        .ok_or_else(|| anyhow!("Unknown slot '{category}'. Available: head, neck, chest"))?;

    let session = Session::open(config_override, premium)?;
    let result = session.handle.unequip_accessory(category).await;
    session.close().await?;

    match result? {
        Some(removed) => println!("Took off {}", removed.def().name),
        None => println!("Nothing worn on {}", category.as_str()),
    }
    Ok(())
}
