//! Quality-scored merging of per-provider records into one canonical answer.
//!
//! Precedence is positional: records are considered in provider rank order
//! (volume catalog, then open bib, then registry) and each attribute takes
//! the value from the highest-ranked provider that has one. Ties cannot
//! happen; rank is total. The cover image is the one exception: the
//! registry's cover wins only when no ranked provider offered any.

use crate::normalize::ProviderRecords;
use bookdex_core::domain::{
    Author, Edition, EditionFormat, EnrichedResponse, ProviderId, Work,
};
use bookdex_core::normalize::{author_key, normalize_title};
use std::collections::HashMap;

/// Merge records from an ISBN-style lookup: at most one work, editions
/// grouped by shared ISBN, authors deduplicated.
#[must_use]
pub(crate) fn merge_lookup(records: Vec<ProviderRecords>) -> EnrichedResponse {
    let mut records = records;
    records.retain(|r| !r.is_empty());
    sort_by_rank(&mut records);

    let works: Vec<Work> = records.iter().filter_map(|r| r.work.clone()).collect();
    let work = merge_works(works);

    let editions = merge_editions(records.iter().flat_map(|r| r.editions.clone()).collect());
    let authors = dedupe_authors(records.iter().flat_map(|r| r.authors.clone()).collect());

    EnrichedResponse { works: work.into_iter().collect(), editions, authors }
}

/// Merge records from a search: works grouped by normalized title, each
/// group merged by rank.
#[must_use]
pub(crate) fn merge_search(records: Vec<ProviderRecords>) -> EnrichedResponse {
    let mut records = records;
    records.retain(|r| !r.is_empty());
    sort_by_rank(&mut records);

    // Group works by normalized title, preserving first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Work>> = HashMap::new();
    for work in records.iter().filter_map(|r| r.work.clone()) {
        let key = normalize_title(&work.title);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(work);
    }

    let works = order
        .into_iter()
        .filter_map(|key| merge_works(groups.remove(&key)?))
        .collect();

    let editions = merge_editions(records.iter().flat_map(|r| r.editions.clone()).collect());
    let authors = dedupe_authors(records.iter().flat_map(|r| r.authors.clone()).collect());

    EnrichedResponse { works, editions, authors }
}

fn sort_by_rank(records: &mut [ProviderRecords]) {
    records.sort_by_key(|r| r.provider().map_or(u8::MAX, |p| p.rank()));
}

/// Merge rank-ordered works describing the same conceptual book.
#[must_use]
pub(crate) fn merge_works(works: Vec<Work>) -> Option<Work> {
    let mut works = works.into_iter();
    let mut merged = works.next()?;

    let mut covers: Vec<(ProviderId, String)> = Vec::new();
    if let Some(cover) = merged.cover_image_url.take() {
        covers.push((merged.primary_provider, cover));
    }

    for work in works {
        if merged.subtitle.is_none() {
            merged.subtitle = work.subtitle.clone();
        }
        if merged.description.is_none() {
            merged.description = work.description.clone();
        }
        if merged.first_publication_year.is_none() {
            merged.first_publication_year = work.first_publication_year;
        }
        if merged.subject_tags.is_empty() {
            merged.subject_tags = work.subject_tags.clone();
        }
        extend_unique(&mut merged.volume_catalog_ids, &work.volume_catalog_ids);
        extend_unique(&mut merged.open_bib_ids, &work.open_bib_ids);
        extend_unique(&mut merged.isbn_registry_ids, &work.isbn_registry_ids);
        for contributor in &work.contributors {
            if !merged.contributors.contains(contributor) {
                merged.contributors.push(*contributor);
            }
        }
        merged.quality = merged.quality.max(work.quality);
        if let Some(cover) = &work.cover_image_url {
            covers.push((work.primary_provider, cover.clone()));
        }
    }

    merged.cover_image_url = pick_cover(&covers);
    Some(merged)
}

/// Cover selection: the ranked providers already report their largest
/// unambiguous image, so the best-ranked one wins; the registry's cover is
/// used only when it is the only cover on offer.
fn pick_cover(covers: &[(ProviderId, String)]) -> Option<String> {
    covers
        .iter()
        .filter(|(provider, _)| *provider != ProviderId::IsbnRegistry)
        .min_by_key(|(provider, _)| provider.rank())
        .or_else(|| covers.first())
        .map(|(_, url)| url.clone())
}

/// Merge editions that share an ISBN; editions with no ISBN stay separate.
#[must_use]
pub(crate) fn merge_editions(editions: Vec<Edition>) -> Vec<Edition> {
    let mut groups: Vec<Edition> = Vec::new();

    for edition in editions {
        let shared = groups.iter_mut().find(|group| {
            !edition.isbns.is_empty() && group.isbns.iter().any(|isbn| edition.isbns.contains(isbn))
        });
        match shared {
            Some(group) => merge_into_edition(group, &edition),
            None => groups.push(edition),
        }
    }

    for group in &mut groups {
        if group.isbn.is_none() {
            group.isbn = group.isbns.iter().find(|isbn| isbn.len() == 13).cloned();
        }
    }
    groups
}

/// Fold `other` into `base`, which outranks it.
fn merge_into_edition(base: &mut Edition, other: &Edition) {
    extend_unique(&mut base.isbns, &other.isbns);
    if base.isbn.is_none() {
        base.isbn = other.isbn.clone();
    }
    if base.title.is_none() {
        base.title = other.title.clone();
    }
    if base.publisher.is_none() {
        base.publisher = other.publisher.clone();
    }
    if base.publication_date.is_none() {
        base.publication_date = other.publication_date.clone();
    }
    if base.page_count.is_none() {
        base.page_count = other.page_count;
    }
    // `Other` means the provider had no usable format hint.
    if base.format == EditionFormat::Other {
        base.format = other.format;
    }
    if base.language.is_none() {
        base.language = other.language.clone();
    }
    if base.cover_image_url.is_none() {
        base.cover_image_url = other.cover_image_url.clone();
    }
    extend_unique(&mut base.volume_catalog_ids, &other.volume_catalog_ids);
    extend_unique(&mut base.open_bib_ids, &other.open_bib_ids);
    extend_unique(&mut base.isbn_registry_ids, &other.isbn_registry_ids);
    for contributor in &other.contributors {
        if !base.contributors.contains(contributor) {
            base.contributors.push(*contributor);
        }
    }
    base.quality = base.quality.max(other.quality);
}

/// Deduplicate authors by normalized-name key, keeping the most complete
/// instance of each person and the first-seen order.
#[must_use]
pub(crate) fn dedupe_authors(authors: Vec<Author>) -> Vec<Author> {
    let mut order: Vec<String> = Vec::new();
    let mut best: HashMap<String, Author> = HashMap::new();

    for author in authors {
        if author.name.trim().is_empty() {
            continue;
        }
        let key = author_key(&author.name);
        if key.is_empty() {
            continue;
        }
        match best.get(&key) {
            Some(existing) if existing.completeness() >= author.completeness() => {}
            Some(_) => {
                best.insert(key, author);
            }
            None => {
                order.push(key.clone());
                best.insert(key, author);
            }
        }
    }

    order.into_iter().filter_map(|key| best.remove(&key)).collect()
}

fn extend_unique(target: &mut Vec<String>, source: &[String]) {
    for item in source {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdex_core::domain::Gender;

    fn work(provider: ProviderId, quality: u8) -> Work {
        let mut work = Work::from_provider("The Dispossessed", provider);
        work.quality = quality;
        work
    }

    #[test]
    fn test_merge_works_rank_and_fill() {
        let mut volume = work(ProviderId::VolumeCatalog, 80);
        volume.description = Some("From the catalog".to_string());
        let mut openbib = work(ProviderId::OpenBib, 60);
        openbib.description = Some("From open bib".to_string());
        openbib.first_publication_year = Some(1974);

        let merged = merge_works(vec![volume, openbib]).unwrap();
        // Highest-ranked provider wins attributes it has...
        assert_eq!(merged.description.as_deref(), Some("From the catalog"));
        // ...and lower-ranked providers fill the gaps.
        assert_eq!(merged.first_publication_year, Some(1974));
        assert_eq!(merged.primary_provider, ProviderId::VolumeCatalog);
        assert_eq!(merged.contributors, vec![ProviderId::VolumeCatalog, ProviderId::OpenBib]);
        assert_eq!(merged.quality, 80);
        assert!(merged.is_consistent());
    }

    #[test]
    fn test_cover_prefers_ranked_providers() {
        let mut volume = work(ProviderId::VolumeCatalog, 80);
        volume.cover_image_url = Some("https://img.example/volume.jpg".to_string());
        let mut registry = work(ProviderId::IsbnRegistry, 30);
        registry.cover_image_url = Some("https://img.example/registry.jpg".to_string());

        let merged = merge_works(vec![volume, registry]).unwrap();
        assert_eq!(merged.cover_image_url.as_deref(), Some("https://img.example/volume.jpg"));
    }

    #[test]
    fn test_registry_cover_wins_when_alone() {
        let volume = work(ProviderId::VolumeCatalog, 80);
        let mut registry = work(ProviderId::IsbnRegistry, 30);
        registry.cover_image_url = Some("https://img.example/registry.jpg".to_string());

        let merged = merge_works(vec![volume, registry]).unwrap();
        assert_eq!(merged.cover_image_url.as_deref(), Some("https://img.example/registry.jpg"));
    }

    #[test]
    fn test_merge_editions_groups_by_shared_isbn() {
        let mut catalog = Edition::from_provider(ProviderId::VolumeCatalog);
        catalog.isbns = vec!["0261103571".to_string(), "9780261103573".to_string()];
        catalog.isbn = Some("9780261103573".to_string());
        let mut registry = Edition::from_provider(ProviderId::IsbnRegistry);
        registry.isbns = vec!["9780261103573".to_string()];
        registry.format = EditionFormat::Paperback;
        registry.page_count = Some(423);

        let merged = merge_editions(vec![catalog, registry]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].format, EditionFormat::Paperback);
        assert_eq!(merged[0].page_count, Some(423));
        assert_eq!(
            merged[0].contributors,
            vec![ProviderId::VolumeCatalog, ProviderId::IsbnRegistry]
        );
        assert!(merged[0].is_consistent());
    }

    #[test]
    fn test_editions_without_isbns_stay_separate() {
        let a = Edition::from_provider(ProviderId::VolumeCatalog);
        let b = Edition::from_provider(ProviderId::OpenBib);
        assert_eq!(merge_editions(vec![a, b]).len(), 2);
    }

    #[test]
    fn test_dedupe_authors_keeps_most_complete() {
        let sparse = Author::named("Gabriel Garcia Marquez");
        let rich = Author {
            name: "Gabriel García Márquez".to_string(),
            gender: Gender::Male,
            birth_year: Some(1927),
            bio: None,
        };

        let deduped = dedupe_authors(vec![sparse, rich.clone()]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0], rich);
    }

    #[test]
    fn test_dedupe_authors_no_key_collisions_survive() {
        let authors = dedupe_authors(vec![
            Author::named("Ursula K. Le Guin"),
            Author::named("ursula k le guin"),
            Author::named("Frank Herbert"),
        ]);
        assert_eq!(authors.len(), 2);
    }
}
