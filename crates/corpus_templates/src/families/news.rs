//! News family: long-form articles with editorial metadata and engagement
//! counters, and reader comments with optional reply threads.

use super::maybe;
use crate::document::Document;
use crate::fake::{format_timestamp, FakeData};
use crate::registry::{CorpusRng, SizeBand, TemplateError, TemplateFamily, TierSpec};
use rand::Rng;
use serde_json::{json, Value};

const TIERS: &[TierSpec] = &[
    TierSpec {
        name: "article",
        weight: 0.8,
        band: SizeBand::new(5_000, 20_000),
        description: "news article",
    },
    TierSpec {
        name: "comment",
        weight: 0.2,
        band: SizeBand::new(300, 1_500),
        description: "reader comment",
    },
];

const CATEGORIES: &[&str] = &[
    "Politics",
    "Technology",
    "Business",
    "Sports",
    "Entertainment",
    "Health",
    "Science",
    "World News",
    "Local News",
    "Opinion",
    "Weather",
    "Finance",
];

const SOURCES: &[&str] = &[
    "Reuters",
    "Associated Press",
    "BBC",
    "CNN",
    "Fox News",
    "The Guardian",
    "New York Times",
    "Washington Post",
    "Wall Street Journal",
    "USA Today",
];

const EDITIONS: &[&str] = &["Morning", "Evening", "Weekend", "Online"];
const URGENCY: &[&str] = &["low", "medium", "high", "breaking"];
const CONTENT_TYPES: &[&str] = &["news", "analysis", "opinion", "feature", "breaking"];
const SENTIMENTS: &[&str] = &["positive", "negative", "neutral"];
const STATUSES: &[&str] = &["published", "draft", "archived", "scheduled"];

const HOUR: i64 = 3_600;

/// `article`/`comment` tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct NewsFamily;

impl TemplateFamily for NewsFamily {
    fn name(&self) -> &'static str {
        "news"
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
            "article" => article(id, &mut fake),
            "comment" => {
                let mut comment = comment(&mut fake);
                comment["id"] = json!(id);
                comment["article_id"] = json!(format!("article_{}", fake.int_range(0, 99_999)));
                comment
            }
            other => return Err(self.unknown_tier(other)),
        };
        Document::from_value(value)
    }
}

fn headline<R: Rng>(fake: &mut FakeData<R>, word_count: usize) -> String {
    let sentence = fake.sentence(word_count);
    sentence.trim_end_matches('.').to_string()
}

fn catch_phrases<R: Rng>(fake: &mut FakeData<R>, min: i64, max: i64) -> Vec<String> {
    let count = fake.int_range(min, max);
    (0..count).map(|_| fake.title(3)).collect()
}

fn reply<R: Rng>(fake: &mut FakeData<R>) -> Value {
    json!({
        "id": fake.uuid(),
        "author": fake.full_name(),
        "content": fake.text(100),
        "timestamp": fake.datetime_within(30),
        "likes": fake.int_range(0, 10),
    })
}

fn comment<R: Rng>(fake: &mut FakeData<R>) -> Value {
    let replies: Vec<Value> = if fake.bool_with_probability(0.3) {
        let count = fake.int_range(0, 3);
        (0..count).map(|_| reply(fake)).collect()
    } else {
        Vec::new()
    };
    json!({
        "id": fake.uuid(),
        "author": fake.full_name(),
        "content": fake.text(200),
        "timestamp": fake.datetime_within(30),
        "likes": fake.int_range(0, 50),
        "replies": replies,
        "flagged": fake.bool_with_probability(0.05),
        "verified_reader": fake.bool_with_probability(0.7),
    })
}

fn related_article<R: Rng>(fake: &mut FakeData<R>) -> Value {
    json!({
        "id": fake.uuid(),
        "headline": headline(fake, 8),
        "url": fake.url(),
        "category": fake.pick(CATEGORIES),
        "published": fake.datetime_within(180),
        "relevance_score": fake.float(0.1, 1.0, 2),
    })
}

fn media<R: Rng>(fake: &mut FakeData<R>) -> Value {
    let featured_image = maybe(fake, 0.8, |f| {
        json!({
            "url": f.image_url(1200, 800),
            "caption": f.sentence(8),
            "credit": f.full_name(),
            "alt_text": f.sentence(6),
        })
    });
    let gallery: Vec<Value> = if fake.bool_with_probability(0.3) {
        let count = fake.int_range(0, 5);
        (0..count)
            .map(|_| {
                json!({
                    "url": fake.image_url(800, 600),
                    "caption": fake.sentence(6),
                    "credit": fake.full_name(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };
    let video = maybe(fake, 0.2, |f| {
        json!({
            "url": f.url(),
            "duration": format!("{}:{}", f.int_range(1, 10), f.int_range(10, 59)),
            "thumbnail": f.image_url(640, 480),
        })
    });
    json!({
        "featured_image": featured_image,
        "gallery": gallery,
        "video": video,
    })
}

fn editorial<R: Rng>(fake: &mut FakeData<R>, published: i64) -> Value {
    let corrections: Vec<Value> = if fake.bool_with_probability(0.1) {
        let count = fake.int_range(0, 2);
        (0..count)
            .map(|_| {
                let at = published + fake.int_range(1, 72) * HOUR;
                json!({
                    "date": format_timestamp(at),
                    "correction": fake.sentence(10),
                })
            })
            .collect()
    } else {
        Vec::new()
    };
    json!({
        "editor": fake.full_name(),
        "fact_checked": fake.bool_with_probability(0.85),
        "fact_checker": maybe(fake, 0.85, |f| json!(f.full_name())),
        "editorial_notes": maybe(fake, 0.3, |f| json!(f.text(100))),
        "corrections": corrections,
    })
}

fn article<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let category = *fake.pick(CATEGORIES);
    let source = *fake.pick(SOURCES);

    let comment_count = fake.int_range(0, 200);
    let comments: Vec<Value> = (0..comment_count.min(15)).map(|_| comment(fake)).collect();
    let related_count = fake.int_range(2, 6);
    let related: Vec<Value> = (0..related_count).map(|_| related_article(fake)).collect();

    let published = fake.epoch_within(365);
    let created = published - fake.int_range(1, 48) * HOUR;
    let last_updated = published + fake.int_range(0, 24) * HOUR;
    let embargo_until = maybe(fake, 0.1, |f| {
        json!(format_timestamp(published + f.int_range(1, 30) * 24 * HOUR))
    });

    let coordinates = maybe(fake, 0.6, |f| {
        let (lat, lon) = f.coordinates();
        json!({ "lat": lat, "lon": lon })
    });

    let specialization_count = fake.int_range(2, 5) as usize;
    let tag_count = fake.int_range(3, 8) as usize;
    let keyword_count = fake.int_range(5, 12) as usize;
    let subsection = fake.title(1);
    let media = media(fake);
    let editorial = editorial(fake, published);
    let read_count = fake.int_range(2, 5);
    let recommended_reads: Vec<String> = (0..read_count).map(|_| fake.sentence(8)).collect();

    json!({
        "id": id,
        "headline": headline(fake, 10),
        "subheadline": maybe(fake, 0.7, |f| json!(f.sentence(15))),
        "content": {
            "lead": fake.text(300),
            "body": fake.text(3000),
            "summary": fake.text(200),
            "word_count": fake.int_range(300, 2000),
        },
        "author": {
            "name": fake.full_name(),
            "email": fake.email(),
            "bio": fake.text(150),
            "twitter": format!("@{}", fake.user_name()),
            "experience_years": fake.int_range(1, 25),
            "specializations": fake.words(specialization_count),
        },
        "publication": {
            "source": source,
            "section": category,
            "subsection": subsection,
            "edition": fake.pick(EDITIONS),
            "page_number": maybe(fake, 0.3, |f| json!(f.int_range(1, 50))),
        },
        "timestamps": {
            "created": format_timestamp(created),
            "published": format_timestamp(published),
            "last_updated": format_timestamp(last_updated),
            "embargo_until": embargo_until,
        },
        "classification": {
            "category": category,
            "tags": fake.words(tag_count),
            "topics": catch_phrases(fake, 2, 5),
            "urgency": fake.pick(URGENCY),
            "content_type": fake.pick(CONTENT_TYPES),
        },
        "location": {
            "dateline": fake.city(),
            "country": fake.country(),
            "region": fake.region(),
            "coordinates": coordinates,
        },
        "media": media,
        "seo": {
            "meta_title": headline(fake, 8),
            "meta_description": fake.text(160),
            "keywords": fake.words(keyword_count),
            "url_slug": fake.slug(),
            "canonical_url": fake.url(),
        },
        "engagement": {
            "views": fake.int_range(100, 50_000),
            "unique_views": fake.int_range(50, 25_000),
            "shares": {
                "facebook": fake.int_range(0, 1000),
                "twitter": fake.int_range(0, 2000),
                "linkedin": fake.int_range(0, 500),
                "reddit": fake.int_range(0, 300),
                "email": fake.int_range(0, 200),
            },
            "comments_count": comment_count,
            "reactions": {
                "likes": fake.int_range(0, 1000),
                "dislikes": fake.int_range(0, 100),
                "love": fake.int_range(0, 200),
                "angry": fake.int_range(0, 150),
                "sad": fake.int_range(0, 50),
            },
            "read_time": format!("{} minutes", fake.int_range(2, 15)),
        },
        "comments": {
            "total": comment_count,
            "moderated": fake.bool_with_probability(0.8),
            "recent": comments,
        },
        "related_content": {
            "related_articles": related,
            "trending_topics": catch_phrases(fake, 3, 7),
            "recommended_reads": recommended_reads,
        },
        "analytics": {
            "sentiment": fake.pick(SENTIMENTS),
            "readability_score": fake.float(5.0, 15.0, 1),
            "engagement_score": fake.float(0.1, 10.0, 2),
            "virality_coefficient": fake.float(0.01, 5.0, 3),
            "bounce_rate": fake.float(0.2, 0.8, 2),
            "time_on_page": fake.int_range(30, 600),
        },
        "editorial": editorial,
        "status": fake.pick(STATUSES),
        "visibility": {
            "public": fake.bool_with_probability(0.95),
            "paywall": fake.bool_with_probability(0.2),
            "subscriber_only": fake.bool_with_probability(0.15),
            "region_restricted": fake.bool_with_probability(0.05),
        },
    })
}
