//! Open-bib normalizer.

use super::{
    ProviderRecords, authors_from_names, completeness_score, expand_isbns, primary_isbn13,
};
use bookdex_core::domain::{Edition, ProviderId, Work};
use bookdex_core::ports::providers::OpenBibDoc;

const PROVIDER: ProviderId = ProviderId::OpenBib;

/// How many subject tags to carry over; open-bib subject lists run into the
/// hundreds for popular works.
const MAX_SUBJECTS: usize = 10;

/// Normalize one open-bib document (search doc or edition record) into
/// canonical records.
#[must_use]
pub fn normalize_doc(doc: &OpenBibDoc) -> ProviderRecords {
    let cover = doc
        .cover_id
        .map(|id| format!("https://covers.openbib.example/b/id/{id}-L.jpg"));

    let work = doc.title.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(|title| {
        let mut work = Work::from_provider(title, PROVIDER);
        work.subtitle = doc.subtitle.clone().filter(|s| !s.trim().is_empty());
        work.first_publication_year = doc.first_publish_year;
        work.subject_tags = doc.subjects.iter().take(MAX_SUBJECTS).cloned().collect();
        work.open_bib_ids = vec![doc.key.clone()];
        work.cover_image_url = cover.clone();

        let present = [
            true,
            work.subtitle.is_some(),
            work.first_publication_year.is_some(),
            !work.subject_tags.is_empty(),
            work.cover_image_url.is_some(),
        ]
        .iter()
        .filter(|p| **p)
        .count();
        work.quality = completeness_score(present, 6);
        work
    });

    let isbns = expand_isbns(doc.isbns.iter().map(String::as_str));

    let mut edition = Edition::from_provider(PROVIDER);
    edition.isbn = primary_isbn13(&isbns);
    edition.isbns = isbns;
    edition.title = doc.title.clone().map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    edition.publisher = doc.publishers.first().cloned();
    edition.publication_date = doc
        .publish_dates
        .first()
        .map(|d| d.trim().to_string())
        .filter(|d| d.chars().take(4).all(|c| c.is_ascii_digit()) && d.len() >= 4);
    edition.page_count = doc.number_of_pages;
    edition.language = doc.languages.first().cloned();
    edition.cover_image_url = cover;
    edition.open_bib_ids = if doc.edition_keys.is_empty() {
        vec![doc.key.clone()]
    } else {
        doc.edition_keys.clone()
    };

    let present = [
        !edition.isbns.is_empty(),
        edition.publisher.is_some(),
        edition.publication_date.is_some(),
        edition.page_count.is_some(),
        edition.language.is_some(),
        edition.cover_image_url.is_some(),
    ]
    .iter()
    .filter(|p| **p)
    .count();
    edition.quality = completeness_score(present, 6);

    let editions = if edition.isbns.is_empty() && edition.title.is_none() {
        Vec::new()
    } else {
        vec![edition]
    };

    ProviderRecords {
        work,
        editions,
        authors: authors_from_names(doc.author_names.iter().map(String::as_str)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> OpenBibDoc {
        OpenBibDoc {
            key: "/works/OL45883W".to_string(),
            title: Some("A Wizard of Earthsea".to_string()),
            subtitle: None,
            author_names: vec!["Ursula K. Le Guin".to_string()],
            first_publish_year: Some(1968),
            subjects: (0..30).map(|i| format!("subject-{i}")).collect(),
            isbns: vec!["9780547773742".to_string()],
            publishers: vec!["Parnassus Press".to_string()],
            publish_dates: vec!["1968".to_string()],
            cover_id: Some(240_727),
            number_of_pages: Some(183),
            languages: vec!["eng".to_string()],
            edition_keys: vec!["OL7603982M".to_string()],
        }
    }

    #[test]
    fn test_normalize_doc_basics() {
        let records = normalize_doc(&doc());
        let work = records.work.unwrap();

        assert_eq!(work.primary_provider, ProviderId::OpenBib);
        assert_eq!(work.first_publication_year, Some(1968));
        assert_eq!(work.subject_tags.len(), MAX_SUBJECTS);
        assert!(work.cover_image_url.unwrap().contains("240727-L.jpg"));
    }

    #[test]
    fn test_edition_uses_edition_keys_when_present() {
        let records = normalize_doc(&doc());
        assert_eq!(records.editions[0].open_bib_ids, vec!["OL7603982M"]);
        assert_eq!(records.editions[0].publication_date.as_deref(), Some("1968"));
    }

    #[test]
    fn test_word_dates_are_dropped() {
        let mut d = doc();
        d.publish_dates = vec!["June 1968".to_string()];
        let records = normalize_doc(&d);
        assert!(records.editions[0].publication_date.is_none());
    }

    #[test]
    fn test_empty_doc_produces_nothing() {
        let empty = OpenBibDoc { key: "/works/OL1W".to_string(), ..OpenBibDoc::default() };
        let records = normalize_doc(&empty);
        assert!(records.work.is_none());
        assert!(records.editions.is_empty());
        assert!(records.authors.is_empty());
    }
}
