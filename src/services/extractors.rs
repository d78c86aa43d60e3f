// src/services/extractors.rs

//! Per-source rules that pull the latest identifier out of a fetched page.
//!
//! Every rule returns `None` when the page does not look the way we expect.
//! That is an ordinary "nothing new" answer, not an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::{ComicSource, Identifier};
use crate::services::FetchedPage;
use crate::utils::{last_path_segment, resolve_url};

static XKCD_COMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div id="comic">\s*<img src="(.*?)" title="(.*?)""#)
        .expect("xkcd pattern is valid")
});

static SMBC_COMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div id="comicimage">\s*?<img src='(.*?)'>"#).expect("smbc pattern is valid")
});

/// Apply the rule for `source` to a fetched page.
pub fn extract(source: ComicSource, page: &FetchedPage) -> Option<Identifier> {
    match source {
        ComicSource::Xkcd => extract_xkcd(page),
        ComicSource::Smbc => extract_smbc(page),
        ComicSource::Jl8 => extract_jl8(page),
    }
}

/// Image URL and hover text from the xkcd front page.
pub fn extract_xkcd(page: &FetchedPage) -> Option<Identifier> {
    let caps = XKCD_COMIC.captures(&page.body)?;
    let src = resolve_url(&page.final_url, &caps[1]);
    Some(Identifier::Pair(src, caps[2].to_string()))
}

/// Strip image URL from the SMBC front page.
pub fn extract_smbc(page: &FetchedPage) -> Option<Identifier> {
    let caps = SMBC_COMIC.captures(&page.body)?;
    Some(Identifier::Url(resolve_url(&page.final_url, &caps[1])))
}

/// Strip number from the URL the JL8 index redirects to.
///
/// A number that does not fit in an `i64` is treated as not found.
pub fn extract_jl8(page: &FetchedPage) -> Option<Identifier> {
    last_path_segment(&page.final_url)
        .parse::<i64>()
        .ok()
        .map(Identifier::Number)
}
