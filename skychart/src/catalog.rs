//! Bundled sample catalog: bright stars, constellation figures and a few
//! deep-sky objects, J2000 positions in degrees.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

use crate::coords::Equatorial;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub hip: u32,
    pub name: Option<String>,
    pub bayer: Option<String>,
    /// IAU constellation id, lowercase.
    pub constellation: Option<String>,
    pub position: Equatorial,
    pub magnitude: f64,
    pub bv: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    /// Lowercase IAU id, e.g. `ori`.
    pub iau_id: String,
    pub name: String,
    /// Figure segments as HIP id pairs.
    pub lines: Vec<(u32, u32)>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DsoType {
    Galaxy,
    Nebula,
    OpenCluster,
    GlobularCluster,
}

impl DsoType {
    pub fn display_name(self) -> &'static str {
        match self {
            DsoType::Galaxy => "Galaxy",
            DsoType::Nebula => "Nebula",
            DsoType::OpenCluster => "Open Cluster",
            DsoType::GlobularCluster => "Globular Cluster",
        }
    }

    /// Group id for markers of this type.
    pub fn gid(self) -> String {
        format!("dso_{self}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dso {
    pub id: String,
    pub name: Option<String>,
    pub kind: DsoType,
    pub position: Equatorial,
    pub magnitude: Option<f64>,
    /// Major axis in arcminutes.
    pub size: f64,
}

/// A solar-system body at a caller-supplied position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub name: String,
    pub position: Equatorial,
    pub magnitude: Option<f64>,
}

impl Planet {
    pub fn new(name: impl Into<String>, position: Equatorial, magnitude: Option<f64>) -> Self {
        Self {
            name: name.into(),
            position,
            magnitude,
        }
    }
}

type StarRow = (
    u32,
    Option<&'static str>,
    Option<&'static str>,
    &'static str,
    f64,
    f64,
    f64,
    f64,
);

#[rustfmt::skip]
const STARS: &[StarRow] = &[
    // Orion
    (27989, Some("Betelgeuse"), Some("α Ori"), "ori", 88.7929, 7.4071, 0.45, 1.85),
    (24436, Some("Rigel"), Some("β Ori"), "ori", 78.6345, -8.2016, 0.18, -0.03),
    (25336, Some("Bellatrix"), Some("γ Ori"), "ori", 81.2828, 6.3497, 1.64, -0.22),
    (25930, Some("Mintaka"), Some("δ Ori"), "ori", 83.0017, -0.2991, 2.25, -0.22),
    (26311, Some("Alnilam"), Some("ε Ori"), "ori", 84.0534, -1.2019, 1.69, -0.18),
    (26727, Some("Alnitak"), Some("ζ Ori"), "ori", 85.1897, -1.9426, 1.74, -0.20),
    (27366, Some("Saiph"), Some("κ Ori"), "ori", 86.9391, -9.6696, 2.07, -0.17),
    (26207, Some("Meissa"), Some("λ Ori"), "ori", 83.7845, 9.9342, 3.39, -0.16),
    (28614, None, Some("μ Ori"), "ori", 90.5958, 9.6473, 4.12, 0.16),
    (22449, None, Some("π3 Ori"), "ori", 72.4600, 6.9613, 3.19, 0.45),
    // Taurus
    (21421, Some("Aldebaran"), Some("α Tau"), "tau", 68.9802, 16.5093, 0.87, 1.54),
    (25428, Some("Elnath"), Some("β Tau"), "tau", 81.5730, 28.6075, 1.65, -0.13),
    (26451, Some("Tianguan"), Some("ζ Tau"), "tau", 84.4112, 21.1426, 3.00, -0.19),
    (20889, Some("Ain"), Some("ε Tau"), "tau", 67.1542, 19.1804, 3.53, 1.01),
    (20205, Some("Prima Hyadum"), Some("γ Tau"), "tau", 64.9483, 15.6276, 3.65, 0.98),
    (20455, None, Some("δ1 Tau"), "tau", 65.7337, 17.5425, 3.77, 0.98),
    (18724, None, Some("λ Tau"), "tau", 60.1701, 12.4903, 3.41, -0.12),
    (17702, Some("Alcyone"), Some("η Tau"), "tau", 56.8712, 24.1051, 2.87, -0.09),
    // Gemini
    (37826, Some("Pollux"), Some("β Gem"), "gem", 116.3290, 28.0262, 1.16, 1.00),
    (36850, Some("Castor"), Some("α Gem"), "gem", 113.6495, 31.8883, 1.58, 0.03),
    (31681, Some("Alhena"), Some("γ Gem"), "gem", 99.4280, 16.3993, 1.93, 0.00),
    (32246, Some("Mebsuta"), Some("ε Gem"), "gem", 100.9830, 25.1311, 2.98, 1.40),
    (30343, Some("Tejat"), Some("μ Gem"), "gem", 95.7400, 22.5136, 2.87, 1.64),
    (29655, Some("Propus"), Some("η Gem"), "gem", 93.7194, 22.5068, 3.31, 1.60),
    (35550, Some("Wasat"), Some("δ Gem"), "gem", 110.0307, 21.9823, 3.50, 0.37),
    (34088, Some("Mekbuda"), Some("ζ Gem"), "gem", 106.0272, 20.5703, 3.79, 0.79),
    // Canis Minor
    (37279, Some("Procyon"), Some("α CMi"), "cmi", 114.8255, 5.2250, 0.40, 0.42),
    (36188, Some("Gomeisa"), Some("β CMi"), "cmi", 111.7877, 8.2893, 2.89, -0.10),
    // Canis Major
    (32349, Some("Sirius"), Some("α CMa"), "cma", 101.2872, -16.7161, -1.46, 0.00),
    (30324, Some("Mirzam"), Some("β CMa"), "cma", 95.6749, -17.9559, 1.98, -0.24),
    (34444, Some("Wezen"), Some("δ CMa"), "cma", 107.0979, -26.3932, 1.83, 0.67),
    (33579, Some("Adhara"), Some("ε CMa"), "cma", 104.6565, -28.9721, 1.50, -0.21),
    (35904, Some("Aludra"), Some("η CMa"), "cma", 111.0238, -29.3031, 2.45, -0.08),
    // Faint field stars around Orion and Monoceros
    (19990, None, None, "eri", 64.2740, 3.5790, 5.21, 0.90),
    (23607, None, None, "ori", 76.1420, -4.6550, 5.51, 0.05),
    (25813, None, None, "ori", 82.7700, 5.9480, 5.35, -0.10),
    (27100, None, None, "ori", 86.1150, 3.2910, 5.62, 1.10),
    (28237, None, None, "ori", 89.5020, 12.6510, 5.74, 0.20),
    (31978, None, None, "mon", 100.2210, 4.8560, 5.89, 0.35),
    (33449, None, None, "mon", 104.2350, 10.0210, 6.02, 1.05),
    (35210, None, None, "gem", 109.1390, 16.5400, 5.78, 0.12),
    // Ursa Major
    (54061, Some("Dubhe"), Some("α UMa"), "uma", 165.9320, 61.7510, 1.81, 1.06),
    (53910, Some("Merak"), Some("β UMa"), "uma", 165.4603, 56.3824, 2.34, 0.03),
    (58001, Some("Phecda"), Some("γ UMa"), "uma", 178.4577, 53.6948, 2.41, 0.04),
    (59774, Some("Megrez"), Some("δ UMa"), "uma", 183.8565, 57.0326, 3.32, 0.08),
    (62956, Some("Alioth"), Some("ε UMa"), "uma", 193.5073, 55.9598, 1.76, -0.02),
    (65378, Some("Mizar"), Some("ζ UMa"), "uma", 200.9814, 54.9254, 2.23, 0.06),
    (67301, Some("Alkaid"), Some("η UMa"), "uma", 206.8856, 49.3133, 1.85, -0.10),
    // Cassiopeia
    (3179, Some("Schedar"), Some("α Cas"), "cas", 10.1268, 56.5373, 2.24, 1.17),
    (746, Some("Caph"), Some("β Cas"), "cas", 2.2945, 59.1498, 2.28, 0.38),
    (4427, None, Some("γ Cas"), "cas", 14.1772, 60.7167, 2.15, -0.15),
    (6686, Some("Ruchbah"), Some("δ Cas"), "cas", 21.4540, 60.2353, 2.66, 0.13),
    (8886, Some("Segin"), Some("ε Cas"), "cas", 28.5989, 63.6701, 3.35, -0.15),
    // Lyra
    (91262, Some("Vega"), Some("α Lyr"), "lyr", 279.2347, 38.7837, 0.03, 0.00),
    (91971, None, Some("ζ1 Lyr"), "lyr", 281.1932, 37.6051, 4.34, 0.19),
    (92420, Some("Sheliak"), Some("β Lyr"), "lyr", 282.5200, 33.3627, 3.52, 0.00),
    (93194, Some("Sulafat"), Some("γ Lyr"), "lyr", 284.7359, 32.6896, 3.25, -0.05),
    // Cygnus
    (102098, Some("Deneb"), Some("α Cyg"), "cyg", 310.3580, 45.2803, 1.25, 0.09),
    (100453, Some("Sadr"), Some("γ Cyg"), "cyg", 305.5571, 40.2567, 2.23, 0.67),
    (95947, Some("Albireo"), Some("β Cyg"), "cyg", 292.6803, 27.9597, 3.05, 1.13),
    (102488, Some("Aljanah"), Some("ε Cyg"), "cyg", 311.5528, 33.9703, 2.48, 1.03),
    (97165, None, Some("δ Cyg"), "cyg", 296.2437, 45.1308, 2.86, -0.03),
    // Leo
    (49669, Some("Regulus"), Some("α Leo"), "leo", 152.0930, 11.9672, 1.36, -0.09),
    (57632, Some("Denebola"), Some("β Leo"), "leo", 177.2649, 14.5721, 2.14, 0.09),
    (50583, Some("Algieba"), Some("γ1 Leo"), "leo", 154.9931, 19.8415, 2.01, 1.13),
    (54872, Some("Zosma"), Some("δ Leo"), "leo", 168.5271, 20.5237, 2.56, 0.12),
    (54879, Some("Chertan"), Some("θ Leo"), "leo", 168.5600, 15.4296, 3.33, -0.01),
    // Perseus
    (15863, Some("Mirfak"), Some("α Per"), "per", 51.0807, 49.8612, 1.79, 0.48),
    (14576, Some("Algol"), Some("β Per"), "per", 47.0422, 40.9556, 2.09, -0.05),
    // Other first-magnitude stars
    (11767, Some("Polaris"), Some("α UMi"), "umi", 37.9546, 89.2641, 1.98, 0.64),
    (69673, Some("Arcturus"), Some("α Boo"), "boo", 213.9153, 19.1824, -0.05, 1.23),
    (97649, Some("Altair"), Some("α Aql"), "aql", 297.6958, 8.8683, 0.76, 0.22),
    (24608, Some("Capella"), Some("α Aur"), "aur", 79.1723, 45.9980, 0.08, 0.80),
    (65474, Some("Spica"), Some("α Vir"), "vir", 201.2983, -11.1613, 0.98, -0.24),
    (80763, Some("Antares"), Some("α Sco"), "sco", 247.3519, -26.4320, 1.06, 1.83),
    (30438, Some("Canopus"), Some("α Car"), "car", 95.9880, -52.6957, -0.74, 0.16),
    (71683, Some("Rigil Kentaurus"), Some("α Cen"), "cen", 219.9021, -60.8340, -0.01, 0.71),
    (113368, Some("Fomalhaut"), Some("α PsA"), "psa", 344.4127, -29.6222, 1.17, 0.15),
    (677, Some("Alpheratz"), Some("α And"), "and", 2.0970, 29.0904, 2.07, -0.04),
    (9884, Some("Hamal"), Some("α Ari"), "ari", 31.7934, 23.4624, 2.01, 1.15),
];

#[rustfmt::skip]
const CONSTELLATIONS: &[(&str, &str, &[(u32, u32)])] = &[
    ("ori", "Orion", &[
        (26207, 27989), (26207, 25336), (27989, 26727), (25336, 25930),
        (25930, 26311), (26311, 26727), (26727, 27366), (25930, 24436),
    ]),
    ("tau", "Taurus", &[
        (20205, 20455), (20455, 20889), (20889, 25428), (20205, 21421),
        (21421, 26451), (20205, 18724),
    ]),
    ("gem", "Gemini", &[
        (36850, 37826), (36850, 32246), (32246, 30343), (30343, 29655),
        (37826, 35550), (35550, 34088), (34088, 31681),
    ]),
    ("cmi", "Canis Minor", &[(37279, 36188)]),
    ("cma", "Canis Major", &[
        (32349, 30324), (32349, 34444), (34444, 33579), (34444, 35904),
    ]),
    ("uma", "Ursa Major", &[
        (54061, 53910), (53910, 58001), (58001, 59774), (59774, 54061),
        (59774, 62956), (62956, 65378), (65378, 67301),
    ]),
    ("cas", "Cassiopeia", &[(746, 3179), (3179, 4427), (4427, 6686), (6686, 8886)]),
    ("lyr", "Lyra", &[(91262, 91971), (91971, 92420), (92420, 93194), (93194, 91971)]),
    ("cyg", "Cygnus", &[
        (102098, 100453), (100453, 95947), (100453, 102488), (100453, 97165),
    ]),
    ("leo", "Leo", &[
        (49669, 50583), (50583, 54872), (54872, 57632), (57632, 54879), (54879, 49669),
    ]),
    ("per", "Perseus", &[(15863, 14576)]),
];

#[rustfmt::skip]
const DSOS: &[(&str, Option<&str>, DsoType, f64, f64, Option<f64>, f64)] = &[
    ("M42", Some("Orion Nebula"), DsoType::Nebula, 83.8221, -5.3911, Some(4.0), 85.0),
    ("M78", None, DsoType::Nebula, 86.6908, 0.0792, Some(8.3), 8.0),
    ("M1", Some("Crab Nebula"), DsoType::Nebula, 83.6331, 22.0145, Some(8.4), 6.0),
    ("M45", Some("Pleiades"), DsoType::OpenCluster, 56.7500, 24.1167, Some(1.6), 110.0),
    ("M35", None, DsoType::OpenCluster, 92.2250, 24.3333, Some(5.3), 28.0),
    ("M41", None, DsoType::OpenCluster, 101.5040, -20.7570, Some(4.5), 38.0),
    ("M44", Some("Beehive Cluster"), DsoType::OpenCluster, 130.1000, 19.6667, Some(3.7), 95.0),
    ("NGC 2392", Some("Eskimo Nebula"), DsoType::Nebula, 112.2946, 20.9117, Some(9.1), 0.8),
    ("M31", Some("Andromeda Galaxy"), DsoType::Galaxy, 10.6847, 41.2690, Some(3.4), 178.0),
    ("M81", Some("Bode's Galaxy"), DsoType::Galaxy, 148.8882, 69.0653, Some(6.9), 27.0),
    ("M13", Some("Hercules Cluster"), DsoType::GlobularCluster, 250.4235, 36.4613, Some(5.8), 20.0),
    ("NGC 2419", None, DsoType::GlobularCluster, 114.5354, 38.8824, None, 4.1),
];

/// In-memory catalog with a HIP index.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub stars: Vec<Star>,
    pub constellations: Vec<Constellation>,
    pub dsos: Vec<Dso>,
    hip_index: HashMap<u32, usize>,
}

static BUNDLED: Lazy<Catalog> = Lazy::new(|| {
    let stars = STARS
        .iter()
        .map(|&(hip, name, bayer, con, ra, dec, mag, bv)| Star {
            hip,
            name: name.map(str::to_string),
            bayer: bayer.map(str::to_string),
            constellation: Some(con.to_string()),
            position: Equatorial::new(ra, dec),
            magnitude: mag,
            bv: Some(bv),
        })
        .collect();
    let constellations = CONSTELLATIONS
        .iter()
        .map(|&(id, name, lines)| Constellation {
            iau_id: id.to_string(),
            name: name.to_string(),
            lines: lines.to_vec(),
        })
        .collect();
    let dsos = DSOS
        .iter()
        .map(|&(id, name, kind, ra, dec, mag, size)| Dso {
            id: id.to_string(),
            name: name.map(str::to_string),
            kind,
            position: Equatorial::new(ra, dec),
            magnitude: mag,
            size,
        })
        .collect();
    Catalog::new(stars, constellations, dsos)
});

impl Catalog {
    pub fn new(stars: Vec<Star>, constellations: Vec<Constellation>, dsos: Vec<Dso>) -> Self {
        let hip_index = stars.iter().enumerate().map(|(i, s)| (s.hip, i)).collect();
        Self {
            stars,
            constellations,
            dsos,
            hip_index,
        }
    }

    /// The catalog compiled into the library.
    pub fn bundled() -> &'static Catalog {
        &BUNDLED
    }

    pub fn star(&self, hip: u32) -> Option<&Star> {
        self.hip_index.get(&hip).map(|&i| &self.stars[i])
    }

    pub fn constellation(&self, iau_id: &str) -> Option<&Constellation> {
        self.constellations
            .iter()
            .find(|c| c.iau_id.eq_ignore_ascii_case(iau_id))
    }

    /// Equatorial endpoints of each figure segment whose stars are known.
    pub fn segments(&self, constellation: &Constellation) -> Vec<(Equatorial, Equatorial)> {
        constellation
            .lines
            .iter()
            .filter_map(|(a, b)| Some((self.star(*a)?.position, self.star(*b)?.position)))
            .collect()
    }

    /// Mean position of a constellation's figure stars, used for its label.
    pub fn label_position(&self, constellation: &Constellation) -> Option<Equatorial> {
        let mut hips: Vec<u32> = constellation
            .lines
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .collect();
        hips.sort_unstable();
        hips.dedup();
        let positions: Vec<Equatorial> = hips
            .iter()
            .filter_map(|h| self.star(*h).map(|s| s.position))
            .collect();
        if positions.is_empty() {
            return None;
        }
        let n = positions.len() as f64;
        let (sx, sy) = positions.iter().fold((0.0, 0.0), |(sx, sy), p| {
            let ra = p.ra.to_radians();
            (sx + ra.cos(), sy + ra.sin())
        });
        let dec = positions.iter().map(|p| p.dec).sum::<f64>() / n;
        Some(Equatorial::new(sy.atan2(sx).to_degrees(), dec))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

/// Magnitude filter, parsed from strings like `"< 5"` or `">= 2.5"`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StarFilter {
    #[default]
    All,
    Magnitude(Comparison, f64),
}

impl StarFilter {
    pub fn brighter_than(limit: f64) -> Self {
        StarFilter::Magnitude(Comparison::Lt, limit)
    }

    pub fn accepts(&self, star: &Star) -> bool {
        match *self {
            StarFilter::All => true,
            StarFilter::Magnitude(cmp, limit) => match cmp {
                Comparison::Lt => star.magnitude < limit,
                Comparison::Le => star.magnitude <= limit,
                Comparison::Gt => star.magnitude > limit,
                Comparison::Ge => star.magnitude >= limit,
            },
        }
    }
}

impl FromStr for StarFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(StarFilter::All);
        }
        let (cmp, rest) = if let Some(r) = s.strip_prefix("<=") {
            (Comparison::Le, r)
        } else if let Some(r) = s.strip_prefix(">=") {
            (Comparison::Ge, r)
        } else if let Some(r) = s.strip_prefix('<') {
            (Comparison::Lt, r)
        } else if let Some(r) = s.strip_prefix('>') {
            (Comparison::Gt, r)
        } else {
            return Err(ConfigError::Filter(s.to_string()));
        };
        let limit: f64 = rest
            .trim()
            .parse()
            .map_err(|_| ConfigError::Filter(s.to_string()))?;
        Ok(StarFilter::Magnitude(cmp, limit))
    }
}

impl fmt::Display for StarFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StarFilter::All => write!(f, "all"),
            StarFilter::Magnitude(cmp, limit) => {
                let op = match cmp {
                    Comparison::Lt => "<",
                    Comparison::Le => "<=",
                    Comparison::Gt => ">",
                    Comparison::Ge => ">=",
                };
                write!(f, "{op} {limit}")
            }
        }
    }
}
