//! Static city name → coordinates table for French cities.

use crate::model::Coordinates;

pub const DEFAULT_CITY: &str = "Paris";

const PARIS: Coordinates = Coordinates::new(48.8566, 2.3522);

const CITIES: &[(&str, Coordinates)] = &[
    // Major cities
    (DEFAULT_CITY, PARIS),
    ("Lyon", Coordinates::new(45.7640, 4.8357)),
    ("Marseille", Coordinates::new(43.2965, 5.3698)),
    ("Toulouse", Coordinates::new(43.6047, 1.4442)),
    ("Nice", Coordinates::new(43.7102, 7.2620)),
    ("Nantes", Coordinates::new(47.2184, -1.5536)),
    ("Strasbourg", Coordinates::new(48.5734, 7.7521)),
    ("Bordeaux", Coordinates::new(44.8378, -0.5792)),
    ("Lille", Coordinates::new(50.6292, 3.0573)),
    ("Rennes", Coordinates::new(48.1173, -1.6778)),
    ("Montpellier", Coordinates::new(43.6108, 3.8767)),
    ("Grenoble", Coordinates::new(45.1885, 5.7245)),
    // Regional cities
    ("Reims", Coordinates::new(49.2583, 4.0317)),
    ("Le Havre", Coordinates::new(49.4944, 0.1079)),
    ("Saint-Étienne", Coordinates::new(45.4397, 4.3872)),
    ("Toulon", Coordinates::new(43.1242, 5.9280)),
    ("Angers", Coordinates::new(47.4784, -0.5632)),
    ("Dijon", Coordinates::new(47.3220, 5.0415)),
    ("Brest", Coordinates::new(48.3905, -4.4861)),
    ("Le Mans", Coordinates::new(48.0077, 0.1984)),
    ("Clermont-Ferrand", Coordinates::new(45.7772, 3.0870)),
    ("Amiens", Coordinates::new(49.8941, 2.2958)),
    ("Aix-en-Provence", Coordinates::new(43.5297, 5.4474)),
    ("Limoges", Coordinates::new(45.8336, 1.2611)),
    ("Tours", Coordinates::new(47.3941, 0.6848)),
    ("Orléans", Coordinates::new(47.9029, 1.9093)),
    ("Metz", Coordinates::new(49.1193, 6.1757)),
    ("Besançon", Coordinates::new(47.2380, 6.0243)),
    ("Perpignan", Coordinates::new(42.6886, 2.8948)),
    ("Caen", Coordinates::new(49.1829, -0.3707)),
    ("Rouen", Coordinates::new(49.4432, 1.0993)),
    ("Nancy", Coordinates::new(48.6921, 6.1844)),
    ("Argenteuil", Coordinates::new(48.9474, 2.2464)),
    ("Montreuil", Coordinates::new(48.8634, 2.4428)),
    ("Mulhouse", Coordinates::new(47.7508, 7.3359)),
    ("Pau", Coordinates::new(43.2951, -0.3708)),
    ("Avignon", Coordinates::new(43.9493, 4.8055)),
];

/// Exact, case-sensitive lookup.
pub fn find(city: &str) -> Option<Coordinates> {
    CITIES
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, coords)| *coords)
}

/// Coordinates for `city`, or the default city's when the name is unknown.
pub fn lookup(city: &str) -> Coordinates {
    find(city).unwrap_or(PARIS)
}

pub fn cities() -> impl Iterator<Item = (&'static str, Coordinates)> {
    CITIES.iter().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_city_resolves() {
        assert_eq!(lookup("Paris"), Coordinates::new(48.8566, 2.3522));
        assert_eq!(lookup("Le Havre"), Coordinates::new(49.4944, 0.1079));
        assert_eq!(lookup("Saint-Étienne"), Coordinates::new(45.4397, 4.3872));
    }

    #[test]
    fn unknown_city_falls_back_to_default() {
        assert_eq!(find("Nonexistent"), None);
        assert_eq!(lookup("Nonexistent"), lookup(DEFAULT_CITY));
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(find("lyon"), None);
        assert_eq!(lookup("lyon"), PARIS);
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<_> = cities().map(|(name, _)| name).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
