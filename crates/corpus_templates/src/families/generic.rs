//! Generic size tiers used for write-throughput testing.
//!
//! Four structural tiers of increasing nesting and text volume:
//! `small` (flat log-like record), `medium` (article with nested metadata),
//! `large` (report with authors and references) and `huge` (book-length
//! document with chapters, appendices and a bibliography).

use crate::document::Document;
use crate::fake::FakeData;
use crate::registry::{CorpusRng, SizeBand, TemplateError, TemplateFamily, TierSpec};
use rand::Rng;
use serde_json::{json, Value};

const TIERS: &[TierSpec] = &[
    TierSpec {
        name: "small",
        weight: 0.40,
        band: SizeBand::new(200, 500),
        description: "flat event record",
    },
    TierSpec {
        name: "medium",
        weight: 0.35,
        band: SizeBand::new(1_500, 5_000),
        description: "article with nested metadata",
    },
    TierSpec {
        name: "large",
        weight: 0.20,
        band: SizeBand::new(5_000, 50_000),
        description: "report with authors and references",
    },
    TierSpec {
        name: "huge",
        weight: 0.05,
        band: SizeBand::at_least(50_000),
        description: "book-length document",
    },
];

const LEVELS: &[&str] = &["INFO", "WARN", "ERROR"];
const SERVICES: &[&str] = &["auth", "api", "web", "mobile"];
const STATUSES: &[i64] = &[200, 404, 500];
const PRIORITIES: &[&str] = &["low", "medium", "high"];
const MEDIUM_CATEGORIES: &[&str] = &["tech", "business", "science"];
const LARGE_CATEGORIES: &[&str] = &["research", "analysis", "report"];
const ROLES: &[&str] = &["lead_author", "co_author", "contributor", "reviewer"];

/// Generic `small`/`medium`/`large`/`huge` tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFamily;

impl TemplateFamily for GenericFamily {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn tiers(&self) -> &'static [TierSpec] {
        TIERS
    }

    fn generate(
        &self,
        tier: &str,
        id: &str,
        rng: &mut CorpusRng,
    ) -> Result<Document, TemplateError> {
        let mut fake = FakeData::new(rng);
        let value = match tier {
            "small" => small(id, &mut fake),
            "medium" => medium(id, &mut fake),
            "large" => large(id, &mut fake),
            "huge" => huge(id, &mut fake),
            other => return Err(self.unknown_tier(other)),
        };
        Document::from_value(value)
    }
}

pub(crate) fn small<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    json!({
        "id": id,
        "timestamp": fake.datetime_within(1),
        "level": fake.pick(LEVELS),
        "service": fake.pick(SERVICES),
        "message": fake.any_sentence(),
        "user_id": fake.int_range(1, 100_000),
        "session": fake.hex_token(8),
        "duration": fake.int_range(10, 1000),
        "status": fake.pick(STATUSES),
    })
}

fn medium<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let paragraph_count = fake.int_range(3, 6) as usize;
    let tag_count = fake.int_range(3, 8) as usize;
    let (city, country, _) = fake.place();
    let (lat, lon) = fake.coordinates();
    json!({
        "id": id,
        "title": fake.any_sentence(),
        "content": fake.paragraphs(paragraph_count),
        "author": {
            "name": fake.full_name(),
            "email": fake.email(),
            "company": fake.company_name(),
        },
        "metadata": {
            "category": fake.pick(MEDIUM_CATEGORIES),
            "tags": fake.words(tag_count),
            "priority": fake.pick(PRIORITIES),
            "views": fake.int_range(0, 10_000),
            "rating": fake.float(1.0, 5.0, 1),
        },
        "timestamps": {
            "created": fake.datetime_within(365),
            "updated": fake.datetime_within(30),
        },
        "location": {
            "country": country,
            "city": city,
            "coordinates": [lon, lat],
        },
        "stats": {
            "word_count": fake.int_range(100, 1000),
            "read_time": fake.int_range(60, 600),
            "engagement": fake.float(0.1, 1.0, 2),
        },
    })
}

fn large<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let author_count = fake.int_range(1, 4);
    let authors: Vec<Value> = (0..author_count)
        .map(|_| {
            let expertise = fake.int_range(3, 8) as usize;
            json!({
                "name": fake.full_name(),
                "email": fake.email(),
                "bio": fake.any_paragraph(),
                "expertise": fake.words(expertise),
            })
        })
        .collect();

    let reference_count = fake.int_range(20, 50);
    let references: Vec<Value> = (0..reference_count)
        .map(|_| {
            let names = fake.int_range(1, 3);
            json!({
                "title": fake.any_sentence(),
                "authors": (0..names).map(|_| fake.full_name()).collect::<Vec<_>>(),
                "year": fake.int_range(2010, 2023),
                "journal": fake.company_name(),
            })
        })
        .collect();

    let tag_count = fake.int_range(8, 15) as usize;
    let keyword_count = fake.int_range(10, 20) as usize;
    let first_page = fake.int_range(1, 100);
    let last_page = fake.int_range(101, 200);

    json!({
        "id": id,
        "title": fake.any_sentence(),
        "subtitle": fake.any_sentence(),
        "content": {
            "introduction": fake.paragraphs(3),
            "body": fake.paragraphs(8),
            "conclusion": fake.paragraphs(2),
        },
        "authors": authors,
        "metadata": {
            "category": fake.pick(LARGE_CATEGORIES),
            "subcategory": fake.word(),
            "tags": fake.words(tag_count),
            "keywords": fake.words(keyword_count),
            "language": "en",
            "word_count": fake.int_range(3000, 8000),
            "read_time": fake.int_range(900, 2400),
        },
        "publishing": {
            "publisher": fake.company_name(),
            "journal": fake.any_sentence(),
            "volume": fake.int_range(1, 50),
            "issue": fake.int_range(1, 12),
            "pages": format!("{}-{}", first_page, last_page),
        },
        "timestamps": {
            "submitted": fake.datetime_within(730),
            "accepted": fake.datetime_within(365),
            "published": fake.datetime_within(180),
        },
        "metrics": {
            "downloads": fake.int_range(0, 10_000),
            "citations": fake.int_range(0, 500),
            "shares": fake.int_range(0, 1000),
            "views": fake.int_range(0, 50_000),
        },
        "references": references,
    })
}

fn huge<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let chapter_count = fake.int_range(10, 15);
    let table_of_contents: Vec<Value> = (0..chapter_count)
        .map(|i| {
            let section_count = fake.int_range(4, 8);
            let sections: Vec<Value> = (0..section_count)
                .map(|j| {
                    json!({
                        "section": format!("{}.{}", i + 1, j + 1),
                        "title": fake.any_sentence(),
                        "page": fake.int_range(i * 20 + j * 3, i * 20 + (j + 1) * 3),
                    })
                })
                .collect();
            json!({
                "chapter": i + 1,
                "title": fake.any_sentence(),
                "page": fake.int_range(i * 20, (i + 1) * 20),
                "sections": sections,
            })
        })
        .collect();
    let keyword_count = fake.int_range(25, 50) as usize;
    let keywords = fake.words(keyword_count);

    json!({
        "id": id,
        "title": fake.any_sentence(),
        "type": "comprehensive_document",
        "abstract": fake.paragraphs(2),
        "table_of_contents": table_of_contents,
        "content": huge_content(fake),
        "contributors": huge_contributors(fake),
        "metadata": {
            "word_count": fake.int_range(50_000, 150_000),
            "page_count": fake.int_range(200, 800),
            "language": "en",
            "version": format!("{}.{}", fake.int_range(1, 3), fake.int_range(0, 9)),
            "keywords": keywords,
        },
        "bibliography": huge_bibliography(fake),
    })
}

fn huge_content<R: Rng>(fake: &mut FakeData<R>) -> Value {
    let chapter_count = fake.int_range(8, 12);
    let chapters: Vec<Value> = (0..chapter_count)
        .map(|i| {
            let subsection_count = fake.int_range(4, 8);
            let subsections: Vec<Value> = (0..subsection_count)
                .map(|_| {
                    json!({
                        "title": fake.any_sentence(),
                        "content": fake.paragraphs(5),
                    })
                })
                .collect();
            json!({
                "number": i + 1,
                "title": fake.any_sentence(),
                "content": fake.paragraphs(15),
                "subsections": subsections,
            })
        })
        .collect();

    let recommendation_count = fake.int_range(8, 15);
    let recommendations: Vec<String> = (0..recommendation_count)
        .map(|_| fake.any_sentence())
        .collect();

    let appendix_count = fake.int_range(3, 6) as u8;
    let appendices: Vec<Value> = (0..appendix_count)
        .map(|i| {
            json!({
                "id": char::from(b'A' + i).to_string(),
                "title": fake.any_sentence(),
                "content": fake.paragraphs(8),
            })
        })
        .collect();

    json!({
        "executive_summary": fake.paragraphs(5),
        "introduction": fake.paragraphs(8),
        "methodology": fake.paragraphs(6),
        "chapters": chapters,
        "conclusion": fake.paragraphs(4),
        "recommendations": recommendations,
        "appendices": appendices,
    })
}

fn huge_contributors<R: Rng>(fake: &mut FakeData<R>) -> Value {
    let count = fake.int_range(5, 10);
    let contributors: Vec<Value> = (0..count)
        .map(|_| {
            let expertise = fake.int_range(5, 10) as usize;
            json!({
                "name": fake.full_name(),
                "role": fake.pick(ROLES),
                "affiliation": fake.company_name(),
                "bio": fake.any_paragraph(),
                "expertise": fake.words(expertise),
            })
        })
        .collect();
    Value::Array(contributors)
}

fn huge_bibliography<R: Rng>(fake: &mut FakeData<R>) -> Value {
    let count = fake.int_range(100, 200);
    let entries: Vec<Value> = (0..count)
        .map(|_| {
            let names = fake.int_range(1, 4);
            json!({
                "authors": (0..names).map(|_| fake.full_name()).collect::<Vec<_>>(),
                "title": fake.any_sentence(),
                "journal": fake.company_name(),
                "year": fake.int_range(2010, 2023),
                "volume": fake.int_range(1, 50),
            })
        })
        .collect();
    Value::Array(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generate(tier: &str, seed: u64) -> Document {
        let mut rng = CorpusRng::seed_from_u64(seed);
        GenericFamily
            .generate(tier, &format!("{}_0", tier), &mut rng)
            .unwrap()
    }

    fn serialized_len(doc: &Document) -> usize {
        serde_json::to_vec(doc).unwrap().len()
    }

    #[test]
    fn test_every_tier_carries_id() {
        for tier in ["small", "medium", "large", "huge"] {
            let doc = generate(tier, 42);
            assert_eq!(doc.id(), format!("{}_0", tier));
        }
    }

    #[test]
    fn test_tiers_grow_in_size() {
        let avg = |tier: &str| -> usize {
            (0..5u64)
                .map(|seed| serialized_len(&generate(tier, seed)))
                .sum::<usize>()
                / 5
        };
        let small = avg("small");
        let medium = avg("medium");
        let large = avg("large");
        let huge = avg("huge");

        assert!(small < medium, "small {} >= medium {}", small, medium);
        assert!(medium < large, "medium {} >= large {}", medium, large);
        assert!(large < huge, "large {} >= huge {}", large, huge);
        assert!(small < 600);
        assert!(huge > 50_000);
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate("large", 9), generate("large", 9));
        assert_ne!(generate("large", 9), generate("large", 10));
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let mut rng = CorpusRng::seed_from_u64(1);
        let err = GenericFamily.generate("tiny", "tiny_0", &mut rng).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownTier { .. }));
    }

    #[test]
    fn test_default_weights_order() {
        let weights = GenericFamily.default_weights();
        let names: Vec<&str> = weights.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["small", "medium", "large", "huge"]);
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}
