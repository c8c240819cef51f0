use rayon::prelude::*;
use tracing::info;

use crate::ident;
use crate::model::{JobCard, RawJobRecord, Target};

/// Keywords found in `text`, case-insensitively, in input order. Keywords
/// are matched as given, surrounding spaces included. Blank keywords never match.
pub fn match_keywords(text: &str, keywords: &[String]) -> Vec<String> {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .filter(|kw| !kw.trim().is_empty() && haystack.contains(&kw.to_lowercase()))
        .cloned()
        .collect()
}

/// Like [`match_keywords`], but `None` when nothing matched.
pub fn find_matches(text: &str, keywords: &[String]) -> Option<Vec<String>> {
    let matched = match_keywords(text, keywords);
    (!matched.is_empty()).then_some(matched)
}

/// Turn a record into a card if at least one of the target's keywords matches.
pub fn to_card(record: &RawJobRecord, target: &Target) -> Option<JobCard> {
    let matched = find_matches(&record.search_text(), &target.keywords)?;
    Some(JobCard {
        company: target.company_name.clone(),
        job_title: record.title.clone(),
        location: record.location.clone(),
        matched_keywords: matched,
        link: record.link.clone(),
        unique_job_id: ident::unique_job_id(&target.company_name, &record.link),
    })
}

/// Filter and decorate a target's records. Output order follows input order.
pub fn validate_and_format(records: &[RawJobRecord], target: &Target) -> Vec<JobCard> {
    info!(
        "Scanning {} jobs from {} for keywords",
        records.len(),
        target.company_name
    );

    let cards: Vec<JobCard> = records
        .par_iter()
        .filter_map(|record| to_card(record, target))
        .collect();

    for card in &cards {
        info!(
            "Match: [{}] in '{}'",
            card.matched_keywords.join(", "),
            card.job_title
        );
    }
    cards
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn record(title: &str, description: &str, link: &str) -> RawJobRecord {
        RawJobRecord {
            title: title.into(),
            location: "Remote".into(),
            description: description.into(),
            link: link.into(),
        }
    }

    #[test]
    fn case_insensitive() {
        let matched = match_keywords("software ENGINEER wanted", &kw(&["Engineer"]));
        assert_eq!(matched, vec!["Engineer".to_string()]);
    }

    #[test]
    fn no_match_is_empty_and_none() {
        let text = "Senior Python Developer, Remote";
        assert!(match_keywords(text, &kw(&["Nurse"])).is_empty());
        assert_eq!(find_matches(text, &kw(&["Nurse"])), None);
    }

    #[test]
    fn preserves_keyword_order() {
        let text = "rust and python and go";
        let matched = match_keywords(text, &kw(&["Go", "Java", "Python", "Rust"]));
        assert_eq!(matched, kw(&["Go", "Python", "Rust"]));
    }

    #[test]
    fn blank_keywords_ignored() {
        assert!(match_keywords("anything", &kw(&["", "   "])).is_empty());
    }

    #[test]
    fn keyword_spaces_are_significant() {
        let text = "Frontend role using JavaScript";
        assert!(match_keywords(text, &kw(&[" Java "])).is_empty());
        assert_eq!(match_keywords(text, &kw(&["Java"])), kw(&["Java"]));
        assert_eq!(match_keywords("Senior Java developer", &kw(&[" Java "])), kw(&[" Java "]));
    }

    #[test]
    fn validator_drops_unmatched_records() {
        let target = Target {
            company_name: "Acme Corp".into(),
            careers_url: "https://acme.example.com/careers".into(),
            keywords: kw(&["Python"]),
        };
        let records = vec![
            record("Senior Python Developer", "", "https://acme.example.com/jobs/4012345"),
            record("Registered Nurse", "Night shifts", "https://acme.example.com/jobs/4012346"),
            record("Data Engineer", "Uses python daily", "#"),
        ];

        let cards = validate_and_format(&records, &target);
        assert!(cards.len() <= records.len());
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].job_title, "Senior Python Developer");
        assert_eq!(cards[0].unique_job_id, "ACMECORP-4012345");
        assert_eq!(cards[0].matched_keywords, kw(&["Python"]));
        assert_eq!(cards[1].unique_job_id, "N/A");
    }

    #[test]
    fn location_counts_toward_match() {
        let target = Target {
            company_name: "Acme".into(),
            careers_url: String::new(),
            keywords: kw(&["remote"]),
        };
        let card = to_card(&record("Analyst", "", "#"), &target).unwrap();
        assert_eq!(card.matched_keywords, kw(&["remote"]));
        assert_eq!(card.company, "Acme");
    }
}
