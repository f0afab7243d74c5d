/// Network names and their sidebar icons. Checked in this order, and a name
/// that contains another one has to come before it.
const TV_ICONS: &[(&str, &str)] = &[
    ("acc network extra", "[](#i/acc-network-extra)"),
    ("acc network", "[](#i/acc-network)"),
    ("big ten network", "[](#i/big-ten-network)"),
    ("longhorn network", "[](#i/longhorn-network)"),
    ("sec network", "[](#i/sec-network)"),
    ("cbs sports", "[](#i/cbs-sports)"),
    ("cbs", "[](#i/cbs)"),
    ("espn2", "[](#i/espn2)"),
    ("espn3", "[](#i/espn3)"),
    ("espnu", "[](#i/espnu)"),
    ("espn", "[](#i/espn)"),
    ("fox sports", "[](#i/fox-sports)"),
    ("fox", "[](#i/fox)"),
    ("fs1", "[](#i/fs1)"),
    ("nbc sports", "[](#i/nbc-sports)"),
    ("nbc", "[](#i/nbc)"),
    ("pac12", "[](#i/pac12-network)"),
    ("abc", "[](#i/abc)"),
    ("rsn", "[](#i/rsn)"),
    ("tbs", "[](#i/tbs)"),
    ("tnt", "[](#i/tnt)"),
    ("tru tv", "[](#i/tru-tv)"),
];

const SPORT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("baseball", "BB"),
    ("basketball", "BB"),
    ("cross country", "XC"),
    ("field hockey", "FH"),
    ("football", "FB"),
    ("golf", "GOLF"),
    ("lacrosse", "LAX"),
    ("rowing", "ROW"),
    ("soccer", "SOC"),
    ("softball", "SFTBL"),
    ("swimming & diving", "SWIM"),
    ("tennis", "TEN"),
    ("track & field", "TRACK"),
    ("volleyball", "VB"),
];

enum Piece {
    Raw(String),
    Icon(&'static str),
}

/// Turn a coverage string like `ESPN/ACC Network` into icon links. Each
/// network is substituted at most once, and text already replaced by an icon
/// is never matched again.
pub fn format_tv_for_display(tv: Option<&str>) -> String {
    let Some(tv) = tv else {
        return String::new();
    };

    let mut pieces = vec![Piece::Raw(tv.to_lowercase().replace('/', " "))];

    for &(name, icon) in TV_ICONS {
        let hit = pieces.iter().enumerate().find_map(|(i, piece)| match piece {
            Piece::Raw(text) => text.find(name).map(|at| (i, at)),
            Piece::Icon(_) => None,
        });
        let Some((i, at)) = hit else {
            continue;
        };

        let split = match &pieces[i] {
            Piece::Raw(text) => vec![
                Piece::Raw(text[..at].to_string()),
                Piece::Icon(icon),
                Piece::Raw(text[at + name.len()..].to_string()),
            ],
            Piece::Icon(_) => continue,
        };
        pieces.splice(i..=i, split);
    }

    pieces
        .iter()
        .map(|piece| match piece {
            Piece::Raw(text) => text.as_str(),
            Piece::Icon(icon) => *icon,
        })
        .collect()
}

/// Short sport label for the compact table, e.g. `MBB` or `SFTBL`. Sports
/// without an abbreviation keep their name.
pub fn format_sport_for_display(sport: &str, gender: Option<&str>) -> String {
    let lower = sport.to_lowercase();
    let abbreviation = SPORT_ABBREVIATIONS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, abbr)| *abbr)
        .unwrap_or(sport);

    let prefix = match gender.map(str::to_lowercase).as_deref() {
        Some("men's") => "M",
        Some("women's") => "W",
        _ => "",
    };

    format!("{}{}", prefix, abbreviation)
}

pub fn format_scores_for_display(score: &str, opponent_score: Option<&str>) -> String {
    match opponent_score {
        Some(opponent) => format!("{}-{}", score, opponent),
        None => score.to_string(),
    }
}
