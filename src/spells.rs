/// Spell and item ids referenced by the analyzers.
///
/// Icons are the game's icon file names; the presentation layer turns them
/// into image URLs.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spell {
    pub id:   u32,
    pub name: &'static str,
    pub icon: &'static str,
}

const fn spell(id: u32, name: &'static str, icon: &'static str) -> Spell {
    Spell { id, name, icon }
}

// ---------------------------------------------------------------------------
// Resource types (classResources[].type / resourceChangeType)
// ---------------------------------------------------------------------------

pub const RESOURCE_MANA:        u32 = 0;
pub const RESOURCE_SOUL_SHARDS: u32 = 7;

// ---------------------------------------------------------------------------
// Monk: Brewmaster
// ---------------------------------------------------------------------------

pub const STAGGER:            Spell = spell(115069, "Stagger", "monk_stance_drunkenox");
pub const STAGGER_TAKEN:      Spell = spell(124255, "Stagger", "ability_rogue_cheatdeath");
pub const BLACKOUT_STRIKE:    Spell = spell(205523, "Blackout Strike", "ability_monk_blackoutstrike");
pub const STAGGERING_STRIKES: Spell = spell(273464, "Staggering Strikes", "ability_monk_blackoutstrike");

// ---------------------------------------------------------------------------
// Warlock
// ---------------------------------------------------------------------------

pub const AGONY:                     Spell = spell(980, "Agony", "spell_shadow_curseofsargeras");
pub const WRITHE_IN_AGONY_TALENT:    Spell = spell(196102, "Writhe in Agony", "spell_shadow_curseofsargeras");
pub const LIFE_TAP:                  Spell = spell(1454, "Life Tap", "spell_shadow_burningspirit");
pub const EMPOWERED_LIFE_TAP_TALENT: Spell = spell(235157, "Empowered Life Tap", "spell_shadow_burningspirit");
pub const EMPOWERED_LIFE_TAP_BUFF:   Spell = spell(235156, "Empowered Life Tap", "spell_shadow_burningspirit");
pub const SOUL_CONDUIT_TALENT:       Spell = spell(215941, "Soul Conduit", "spell_shadow_soulleech_2");
pub const SOUL_CONDUIT_SHARD_GEN:    Spell = spell(215942, "Soul Conduit", "spell_shadow_soulleech_2");

// ---------------------------------------------------------------------------
// Priest: Holy
// ---------------------------------------------------------------------------

pub const COSMIC_RIPPLE_TALENT: Spell = spell(238136, "Cosmic Ripple", "spell_holy_summonlightwell");
pub const COSMIC_RIPPLE_HEAL:   Spell = spell(243241, "Cosmic Ripple", "spell_holy_summonlightwell");

// ---------------------------------------------------------------------------
// Potions
// ---------------------------------------------------------------------------

pub const BATTLE_POTION_OF_INTELLECT:  Spell = spell(279151, "Battle Potion of Intellect", "inv_alchemy_70_flask03orange");
pub const BATTLE_POTION_OF_STRENGTH:   Spell = spell(279153, "Battle Potion of Strength", "inv_alchemy_70_flask03orange");
pub const BATTLE_POTION_OF_AGILITY:    Spell = spell(279152, "Battle Potion of Agility", "inv_alchemy_70_flask03orange");
pub const BATTLE_POTION_OF_STAMINA:    Spell = spell(279154, "Battle Potion of Stamina", "inv_alchemy_70_flask03orange");
pub const POTION_OF_RISING_DEATH:      Spell = spell(269697, "Potion of Rising Death", "inv_alchemy_80_potion02orange");
pub const POTION_OF_BURSTING_BLOOD:    Spell = spell(251316, "Potion of Bursting Blood", "inv_alchemy_80_potion02orange");
pub const STEELSKIN_POTION:            Spell = spell(251231, "Steelskin Potion", "inv_alchemy_80_potion02orange");
pub const COASTAL_MANA_POTION:         Spell = spell(270373, "Coastal Mana Potion", "inv_alchemy_80_potion01blue");
pub const COASTAL_REJUVENATION_POTION: Spell = spell(270378, "Coastal Rejuvenation Potion", "inv_alchemy_80_potion01purple");
pub const POTION_OF_REPLENISHMENT:     Spell = spell(252753, "Potion of Replenishment", "inv_alchemy_80_potion01blue");
pub const LEYTORRENT_POTION:           Spell = spell(188030, "Leytorrent Potion", "inv_alchemy_70_blue");
