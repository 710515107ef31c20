//! Maps color names and hex values onto the 11 event colors Google
//! Calendar supports. The API only accepts a `colorId` of "1" through
//! "11" so anything the model comes up with has to be snapped to one
//! of those.

/// (category, synonyms, swatches). The first swatch is the current
/// palette color, the second the legacy one still returned by the
/// colors endpoint.
const PALETTE: [(u8, &[&str], &[&str]); 11] = [
    (1, &["lavender", "violet", "lilac", "periwinkle", "light purple"], &["#7986cb", "#a4bdfc"]),
    (2, &["sage", "mint", "seafoam", "light green", "pistachio"], &["#33b679", "#7ae7bf"]),
    (3, &["grape", "purple", "plum", "magenta", "mauve"], &["#8e24aa", "#dbadff"]),
    (4, &["flamingo", "pink", "salmon", "coral", "rose"], &["#e67c73", "#ff887c"]),
    (5, &["banana", "yellow", "gold", "lemon", "mustard"], &["#f6c026", "#fbd75b"]),
    (6, &["tangerine", "orange", "amber", "apricot", "peach"], &["#f5511d", "#ffb878"]),
    (7, &["peacock", "cyan", "turquoise", "light blue", "sky blue", "aqua", "teal"], &["#039be5", "#46d6db"]),
    (8, &["graphite", "gray", "grey", "black", "silver", "charcoal"], &["#616161", "#e1e1e1"]),
    (9, &["blueberry", "blue", "navy", "indigo", "dark blue", "royal blue"], &["#3f51b5", "#5484ed"]),
    (10, &["basil", "green", "dark green", "forest green", "emerald", "olive"], &["#0b8043", "#51b749"]),
    (11, &["tomato", "red", "crimson", "scarlet", "cherry", "maroon"], &["#d50000", "#dc2127"]),
];

fn parse_hex(hex: &str) -> Option<(i32, i32, i32)> {
    let hex = hex.trim().trim_start_matches('#');
    let hex = match hex.len() {
        6 => hex.to_string(),
        // Short form like `f0a`
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        _ => return None,
    };
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let r = i32::from_str_radix(&hex[0..2], 16).ok()?;
    let g = i32::from_str_radix(&hex[2..4], 16).ok()?;
    let b = i32::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

fn looks_like_hex(s: &str) -> bool {
    s.starts_with('#') || (s.len() == 6 && s.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Nearest category by Euclidean distance in RGB space. Ties go to the
/// lowest category number.
pub fn resolve_hex(hex: &str) -> Option<u8> {
    let (r, g, b) = parse_hex(hex)?;
    let mut best: Option<(u8, i32)> = None;
    for (category, _, swatches) in PALETTE.iter() {
        for swatch in swatches.iter() {
            let Some((sr, sg, sb)) = parse_hex(swatch) else {
                continue;
            };
            // Squared distance orders the same as the real distance
            let distance = (r - sr).pow(2) + (g - sg).pow(2) + (b - sb).pow(2);
            match best {
                Some((_, d)) if d <= distance => {}
                _ => best = Some((*category, distance)),
            }
        }
    }
    best.map(|(category, _)| category)
}

pub fn resolve_name(name: &str) -> Option<u8> {
    let name = name.trim().to_lowercase();
    PALETTE
        .iter()
        .find(|(_, synonyms, _)| synonyms.contains(&name.as_str()))
        .map(|(category, _, _)| *category)
}

/// Resolve a color name, hex value, or bare category number to a
/// Google Calendar color id.
pub fn resolve_color(color: &str) -> Option<u8> {
    let color = color.trim();
    if let Ok(n) = color.parse::<u8>()
        && (1..=11).contains(&n)
    {
        return Some(n);
    }
    if looks_like_hex(color) {
        return resolve_hex(color);
    }
    resolve_name(color)
}
