/// Raw map identifier to the name shown to admins.
const MAP_NAMES: [(&str, &str); 11] = [
    ("TheIsland_WP", "The Island"),
    ("TheCenter_WP", "The Center"),
    ("ScorchedEarth_WP", "Scorched Earth"),
    ("Ragnarok_WP", "Ragnarok"),
    ("Aberration_WP", "Aberration"),
    ("Extinction_WP", "Extinction"),
    ("Valguero_WP", "Valguero"),
    ("Astraeos_WP", "Astraeos"),
    ("BobsMissions_WP", "Club ARK"),
    ("SurvivalOfTheFittest_TheIsland_WP", "Survival Of The Fittest"),
    ("LostColony_WP", "Lost Colony"),
];

pub const DEFAULT_MAP: &str = "TheIsland_WP";

pub fn display_name(map_raw: &str) -> &str {
    MAP_NAMES
        .iter()
        .find(|(raw, _)| *raw == map_raw)
        .map(|(_, name)| *name)
        .unwrap_or(map_raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_maps() {
        assert_eq!(display_name("Ragnarok_WP"), "Ragnarok");
        assert_eq!(display_name("Fjordur_WP"), "Fjordur_WP");
    }
}
