//! Heuristic field extraction from listing detail pages.
//!
//! DFImóveis markup has no stable schema: coordinates, prices and images show
//! up in different encodings depending on template and ad tier. Every field
//! is extracted by an ordered chain of strategies where the first hit wins,
//! and absent data never raises an error. Coordinates are the one required
//! field: a page that yields none (or a zero value) produces no record.

use crate::models::Property;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;
use uuid::Uuid;

const SITE_ORIGIN: &str = "https://www.dfimoveis.com.br";
const TITLE_MAX_CHARS: usize = 200;
const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";
const FALLBACK_TITLE: &str = "listing";
const FALLBACK_PRICE: &str = "inquire";

static SCRIPT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("script").unwrap());
static HEADING_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static TITLE_CLASS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".titulo-imovel, .property-title, [class*='title']").unwrap());
static PAGE_TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static PRICE_CLASS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".valor, .preco, .price, [class*='price'], [class*='valor']").unwrap());
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static OG_IMAGE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[property='og:image']").unwrap());
static DATA_LAT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-lat], [data-latitude]").unwrap());
static DATA_LNG_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-lng], [data-longitude]").unwrap());
static IFRAME_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe[src]").unwrap());

// Pattern: latitude = -15.8705378; longitude = -47.9686399;
static ASSIGN_LAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)latitude\s*=\s*(-?[0-9]+(?:\.[0-9]+)?)\s*;").unwrap());
static ASSIGN_LNG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)longitude\s*=\s*(-?[0-9]+(?:\.[0-9]+)?)\s*;").unwrap());
// Pattern: new google.maps.LatLng(-15.87, -47.96)
static LATLNG_CALL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)LatLng\(\s*(-?[0-9]+(?:\.[0-9]+)?)\s*,\s*(-?[0-9]+(?:\.[0-9]+)?)\s*\)")
        .unwrap()
});
// Loosely keyed lat/lng pairs in any quoting style
static LOOSE_LAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)["']?\blat(?:itude)?["']?\s*[:=]\s*["']?(-?[0-9]+(?:\.[0-9]+)?)"#).unwrap()
});
static LOOSE_LNG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)["']?\bl(?:ng|on(?:gitude)?)["']?\s*[:=]\s*["']?(-?[0-9]+(?:\.[0-9]+)?)"#)
        .unwrap()
});
// JSON payloads: "latitude": -15.87, ... "longitude": -47.96
static JSON_LAT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""latitude"\s*:\s*"?(-?[0-9]+(?:\.[0-9]+)?)"#).unwrap());
static JSON_LNG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""longitude"\s*:\s*"?(-?[0-9]+(?:\.[0-9]+)?)"#).unwrap());
// Map-embed iframes: ...maps?q=-15.87,-47.96
static EMBED_QUERY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[?&]q=(-?[0-9]+(?:\.[0-9]+)?)\s*,\s*(-?[0-9]+(?:\.[0-9]+)?)").unwrap()
});
// Currency-marked amount anywhere in the page text
static PRICE_SCAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"R\$\s*[\d.,]+").unwrap());

/// Extract one property record from a detail page, or `None` when the page
/// has no resolvable coordinates.
pub fn extract_property(html: &str, source_url: &str) -> Option<Property> {
    let document = Html::parse_document(html);

    let (latitude, longitude) = extract_coordinates(&document)?;

    let price = extract_price(&document);
    let price_value = parse_price_value(&price);

    Some(Property {
        id: derive_id(source_url),
        title: extract_title(&document),
        price,
        price_value,
        image: extract_image(&document),
        link: source_url.to_string(),
        latitude,
        longitude,
    })
}

/// Resolve the coordinate pair, trying each encoding in priority order.
/// A pair where either value is exactly 0 is treated as missing data.
pub fn extract_coordinates(document: &Html) -> Option<(f64, f64)> {
    let scripts: Vec<String> = document
        .select(&SCRIPT_SEL)
        .map(|script| script.text().collect())
        .collect();

    coordinates_from_scripts(&scripts)
        .or_else(|| coordinates_from_data_attrs(document))
        .or_else(|| coordinates_from_map_embed(document))
        .filter(|(lat, lng)| *lat != 0.0 && *lng != 0.0)
}

fn coordinates_from_scripts(scripts: &[String]) -> Option<(f64, f64)> {
    type Strategy = fn(&str) -> Option<(f64, f64)>;
    // First strategy to produce two parseable floats wins
    const STRATEGIES: &[Strategy] = &[
        assignment_pair,
        latlng_call,
        loose_key_pair,
        json_pair,
    ];

    for strategy in STRATEGIES {
        for content in scripts {
            if let Some(pair) = strategy(content) {
                return Some(pair);
            }
        }
    }
    None
}

fn assignment_pair(content: &str) -> Option<(f64, f64)> {
    let lat = capture_f64(&ASSIGN_LAT_RE, content)?;
    let lng = capture_f64(&ASSIGN_LNG_RE, content)?;
    Some((lat, lng))
}

fn latlng_call(content: &str) -> Option<(f64, f64)> {
    let captures = LATLNG_CALL_RE.captures(content)?;
    let lat = captures.get(1)?.as_str().parse().ok()?;
    let lng = captures.get(2)?.as_str().parse().ok()?;
    Some((lat, lng))
}

fn loose_key_pair(content: &str) -> Option<(f64, f64)> {
    let lat = capture_f64(&LOOSE_LAT_RE, content)?;
    let lng = capture_f64(&LOOSE_LNG_RE, content)?;
    Some((lat, lng))
}

fn json_pair(content: &str) -> Option<(f64, f64)> {
    let lat = capture_f64(&JSON_LAT_RE, content)?;
    let lng = capture_f64(&JSON_LNG_RE, content)?;
    Some((lat, lng))
}

fn capture_f64(re: &Regex, content: &str) -> Option<f64> {
    re.captures(content)?.get(1)?.as_str().parse().ok()
}

fn coordinates_from_data_attrs(document: &Html) -> Option<(f64, f64)> {
    let lat = document.select(&DATA_LAT_SEL).find_map(|el| {
        el.value()
            .attr("data-lat")
            .or_else(|| el.value().attr("data-latitude"))
            .and_then(|v| v.trim().parse().ok())
    })?;
    let lng = document.select(&DATA_LNG_SEL).find_map(|el| {
        el.value()
            .attr("data-lng")
            .or_else(|| el.value().attr("data-longitude"))
            .and_then(|v| v.trim().parse().ok())
    })?;
    Some((lat, lng))
}

fn coordinates_from_map_embed(document: &Html) -> Option<(f64, f64)> {
    document.select(&IFRAME_SEL).find_map(|iframe| {
        let src = iframe.value().attr("src")?;
        let captures = EMBED_QUERY_RE.captures(src)?;
        let lat = captures.get(1)?.as_str().parse().ok()?;
        let lng = captures.get(2)?.as_str().parse().ok()?;
        Some((lat, lng))
    })
}

/// First non-empty of: page heading, title-like class, `<title>` before the
/// `|` separator. Truncated to 200 characters.
fn extract_title(document: &Html) -> String {
    let heading = document
        .select(&HEADING_SEL)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty());

    let titled_class = || {
        document
            .select(&TITLE_CLASS_SEL)
            .map(element_text)
            .find(|text| !text.is_empty())
    };

    let page_title = || {
        document.select(&PAGE_TITLE_SEL).next().and_then(|el| {
            let text = element_text(el);
            let before_pipe = text.split('|').next().unwrap_or("").trim().to_string();
            (!before_pipe.is_empty()).then_some(before_pipe)
        })
    };

    let title = heading
        .or_else(titled_class)
        .or_else(page_title)
        .unwrap_or_else(|| FALLBACK_TITLE.to_string());

    title.chars().take(TITLE_MAX_CHARS).collect()
}

/// First price-like element carrying the currency marker, then a regex scan
/// of the whole page text, then the "inquire" placeholder.
fn extract_price(document: &Html) -> String {
    for el in document.select(&PRICE_CLASS_SEL) {
        let text = element_text(el);
        if text.contains("R$") {
            return text;
        }
    }

    let page_text: String = document.root_element().text().collect::<Vec<_>>().join(" ");
    if let Some(found) = PRICE_SCAN_RE.find(&page_text) {
        return found.as_str().trim().to_string();
    }

    FALLBACK_PRICE.to_string()
}

/// Numeric value of a display price: keep digits and the decimal comma,
/// normalize the separator, parse. Unparsable input is 0, never an error.
pub fn parse_price_value(price: &str) -> f64 {
    let cleaned: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();
    cleaned.replacen(',', ".", 1).parse().unwrap_or(0.0)
}

/// First listing-photo image, then any raster image that is not a logo or
/// icon, then the social-preview meta tag, then the placeholder sentinel.
fn extract_image(document: &Html) -> String {
    for img in document.select(&IMG_SEL) {
        let src = img
            .value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .or_else(|| img.value().attr("data-lazy"))
            .unwrap_or("");
        if !src.is_empty()
            && (src.contains("imovel") || src.contains("foto") || src.contains("image"))
        {
            return absolutize(src);
        }
    }

    for img in document.select(&IMG_SEL) {
        let src = img.value().attr("src").unwrap_or("");
        let lower = src.to_lowercase();
        let is_raster = [".jpg", ".jpeg", ".png", ".webp"]
            .iter()
            .any(|ext| lower.contains(ext));
        if is_raster && !lower.contains("logo") && !lower.contains("icon") {
            return absolutize(src);
        }
    }

    if let Some(meta) = document.select(&OG_IMAGE_SEL).next() {
        if let Some(content) = meta.value().attr("content") {
            if !content.is_empty() {
                return content.to_string();
            }
        }
    }

    PLACEHOLDER_IMAGE.to_string()
}

fn absolutize(src: &str) -> String {
    if src.starts_with("http") {
        src.to_string()
    } else {
        format!("{SITE_ORIGIN}{src}")
    }
}

/// Last path segment of the source URL, or a random opaque token when the
/// URL has no usable path.
fn derive_id(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|url| {
            url.path_segments().and_then(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .last()
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string())
}

fn element_text(el: scraper::ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
