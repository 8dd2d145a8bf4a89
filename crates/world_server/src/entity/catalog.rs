//! Built-in entity and item templates.
//!
//! Level files reference entities by internal name (`tree`, `adam`,
//! `cyber_woman`); [`by_internal_name`] maps those to templates.

use super::{Entity, EquippedItems, HumanCharacter, HumanSlot, Item, ItemKind};

const AXE_RESOURCE: &str = "Weapon/BasicAxe";

pub fn basic_axe() -> Item {
    Item {
        name: "BasicAxe".to_string(),
        kind: ItemKind::Axe,
        resource: AXE_RESOURCE.to_string(),
        variation: String::new(),
        attack_damage: 1,
        attack_range: 1.5,
        attack_speed: 2.0,
        attack_radius: 0.6,
        clip_size: 0,
        clip: 0,
        reload_time: 0.0,
        reload_finished_at: None,
    }
}

pub fn dragon_axe() -> Item {
    Item {
        name: "DragonAxe".to_string(),
        attack_damage: 50,
        variation: "dragon".to_string(),
        ..basic_axe()
    }
}

pub fn pistol() -> Item {
    Item {
        name: "Colt".to_string(),
        kind: ItemKind::Pistol,
        resource: "Weapon/Gun/Pistol".to_string(),
        variation: String::new(),
        attack_damage: 1,
        attack_range: 5.0,
        attack_speed: 1.15,
        attack_radius: 0.6,
        clip_size: 100,
        clip: 100,
        reload_time: 2.5,
        reload_finished_at: None,
    }
}

fn right_hand(item: Item) -> EquippedItems {
    EquippedItems {
        right_hand: Some(item),
        left_hand: None,
    }
}

pub fn bandit() -> Entity {
    Entity {
        name: "Bandit".to_string(),
        internal_name: "adam".to_string(),
        max_health: 100,
        health: 100,
        respawn_interval: 60,
        can_aggro: true,
        speed: 2.0,
        equipped: right_hand(basic_axe()),
        human: Some(HumanCharacter::male([
            ("Hair", HumanSlot::new("MilCut", "#FFFFFF")),
            ("Beard", HumanSlot::new("MaleBeard1", "#FFFFFF")),
            ("Legs", HumanSlot::new("MaleSweatPants_Recipe", "#FF0000")),
            ("Chest", HumanSlot::new("MaleShirt2", "#FF0000")),
        ])),
        ..Entity::default()
    }
}

pub fn cyber_woman() -> Entity {
    Entity {
        name: "CyberWoman".to_string(),
        internal_name: "cyber_woman".to_string(),
        resource: "Characters/WomanCyber".to_string(),
        max_health: 100,
        health: 100,
        respawn_interval: 60,
        can_aggro: true,
        speed: 5.0,
        equipped: right_hand(basic_axe()),
        ..Entity::default()
    }
}

/// Choppable tree; regrows after its respawn interval.
pub fn tree() -> Entity {
    Entity {
        name: "Tree".to_string(),
        internal_name: "tree".to_string(),
        max_health: 100,
        health: 100,
        respawn_interval: 30,
        damage_sound: "Sounds/TreeChop".to_string(),
        ..Entity::default()
    }
}

/// Avatar of a connecting client.
pub fn player() -> Entity {
    Entity {
        name: "Player".to_string(),
        internal_name: "player".to_string(),
        max_health: 200,
        health: 200,
        speed: 2.0,
        equipped: right_hand(dragon_axe()),
        human: Some(HumanCharacter::male([
            ("Hair", HumanSlot::new("MilCut", "#000000")),
            ("Beard", HumanSlot::new("MaleBeard1", "#FFFFFF")),
            ("Legs", HumanSlot::new("MaleSweatPants_Recipe", "#000000")),
            ("Feet", HumanSlot::new("TallShoes_Black_Recipe", "")),
            ("Chest", HumanSlot::new("MaleShirt2", "#CACACA")),
        ])),
        ..Entity::default()
    }
}

/// Dropped pistol left behind by a killed object.
pub fn pistol_loot() -> Entity {
    let item = pistol();
    Entity {
        name: item.name.clone(),
        internal_name: "pistol".to_string(),
        resource: item.resource.clone(),
        max_health: 1,
        health: 1,
        ..Entity::default()
    }
}

/// Template referenced by a level object's entity name.
pub fn by_internal_name(name: &str) -> Option<Entity> {
    match name {
        "tree" => Some(tree()),
        "adam" => Some(bandit()),
        "cyber_woman" => Some(cyber_woman()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_internal_name() {
        assert_eq!(by_internal_name("adam").map(|e| e.name), Some("Bandit".to_string()));
        assert_eq!(by_internal_name("tree").map(|e| e.max_health), Some(100));
        assert!(by_internal_name("dragon").is_none());
    }

    #[test]
    fn test_player_wields_dragon_axe() {
        let player = player().instantiate();
        assert_eq!(player.attack_max_damage(), Some(50));
        assert_eq!(player.attack_range(), Some(1.5));
        assert_eq!(player.health, 200);
        assert_eq!(player.human.map(|h| h.slots.len()), Some(5));
    }
}
