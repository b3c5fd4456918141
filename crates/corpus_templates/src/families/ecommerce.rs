//! E-commerce catalog family: products with nested pricing, inventory and
//! review summaries, plus standalone customer reviews.

use super::maybe;
use crate::document::Document;
use crate::fake::FakeData;
use crate::registry::{CorpusRng, SizeBand, TemplateError, TemplateFamily, TierSpec};
use rand::Rng;
use serde_json::{json, Map, Value};

const TIERS: &[TierSpec] = &[
    TierSpec {
        name: "product",
        weight: 0.85,
        band: SizeBand::new(3_000, 12_000),
        description: "catalog product",
    },
    TierSpec {
        name: "review",
        weight: 0.15,
        band: SizeBand::new(300, 1_200),
        description: "customer review",
    },
];

const CATEGORIES: &[&str] = &[
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Toys",
    "Beauty",
    "Automotive",
    "Health",
    "Office",
    "Jewelry",
    "Shoes",
];

const BRANDS: &[&str] = &[
    "Apple", "Samsung", "Nike", "Adidas", "Sony", "Canon", "Dell", "HP", "Microsoft", "Google",
    "Amazon", "Zara", "IKEA", "Toyota",
];

const COLORS: &[&str] = &[
    "Black", "White", "Red", "Blue", "Green", "Yellow", "Purple", "Orange", "Pink", "Brown",
    "Gray", "Silver", "Gold", "Navy", "Beige",
];

const SIZES: &[&str] = &[
    "XS", "S", "M", "L", "XL", "XXL", "6", "7", "8", "9", "10", "11", "12",
];

const PRODUCT_STATUSES: &[&str] = &["active", "inactive", "discontinued", "pre_order"];
const WEIGHT_CLASSES: &[&str] = &["light", "medium", "heavy"];

/// `product`/`review` catalog tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct EcommerceFamily;

impl TemplateFamily for EcommerceFamily {
    fn name(&self) -> &'static str {
        "ecommerce"
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
            "product" => product(id, &mut fake),
            "review" => {
                let mut review = review(&mut fake);
                review["id"] = json!(id);
                review["product_id"] = json!(format!("product_{}", fake.int_range(0, 99_999)));
                review
            }
            other => return Err(self.unknown_tier(other)),
        };
        Document::from_value(value)
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn specifications<R: Rng>(fake: &mut FakeData<R>, category: &str) -> Value {
    let mut specs = Map::new();
    specs.insert("model_year".into(), json!(fake.int_range(2020, 2024)));
    specs.insert(
        "warranty".into(),
        json!(format!("{} years", fake.int_range(1, 5))),
    );
    specs.insert("country_of_origin".into(), json!(fake.country()));

    match category {
        "Electronics" => {
            specs.insert(
                "screen_size".into(),
                json!(format!("{} inches", fake.int_range(10, 65))),
            );
            specs.insert(
                "resolution".into(),
                json!(fake.pick(&["1080p", "4K", "8K"])),
            );
            specs.insert(
                "connectivity".into(),
                json!(fake.pick(&["WiFi", "Bluetooth", "WiFi + Bluetooth"])),
            );
            specs.insert(
                "power_consumption".into(),
                json!(format!("{}W", fake.int_range(50, 500))),
            );
        }
        "Clothing" => {
            specs.insert(
                "fabric".into(),
                json!(fake.pick(&["Cotton", "Polyester", "Silk", "Wool", "Linen"])),
            );
            specs.insert("care_instructions".into(), json!("Machine wash cold"));
            specs.insert(
                "fit_type".into(),
                json!(fake.pick(&["Regular", "Slim", "Loose", "Athletic"])),
            );
        }
        "Home & Garden" => {
            specs.insert(
                "room_type".into(),
                json!(fake.pick(&["Living Room", "Bedroom", "Kitchen", "Bathroom", "Garden"])),
            );
            specs.insert(
                "assembly_required".into(),
                json!(fake.bool_with_probability(0.5)),
            );
            specs.insert(
                "indoor_outdoor".into(),
                json!(fake.pick(&["Indoor", "Outdoor", "Both"])),
            );
        }
        _ => {}
    }

    Value::Object(specs)
}

fn review<R: Rng>(fake: &mut FakeData<R>) -> Value {
    let photos: Vec<String> = if fake.bool_with_probability(0.2) {
        let count = fake.int_range(0, 3);
        (0..count).map(|_| fake.image_url(800, 600)).collect()
    } else {
        Vec::new()
    };
    json!({
        "id": fake.uuid(),
        "customer_name": fake.full_name(),
        "rating": fake.int_range(1, 5),
        "title": fake.title(6),
        "content": fake.text(300),
        "verified_purchase": fake.bool_with_probability(0.8),
        "helpful_votes": fake.int_range(0, 50),
        "date": fake.date_within(365),
        "photos": photos,
    })
}

fn product<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let category = *fake.pick(CATEGORIES);
    let brand = *fake.pick(BRANDS);
    let specs = specifications(fake, category);

    let review_count = fake.int_range(0, 500);
    let recent_reviews: Vec<Value> = (0..review_count.min(10)).map(|_| review(fake)).collect();

    let subcategory = title_case(fake.word());
    let image_count = fake.int_range(1, 6);
    let images: Vec<Value> = (0..image_count)
        .map(|i| {
            json!({
                "url": fake.image_url(800, 600),
                "alt_text": format!("{} product image", brand),
                "is_primary": i == 0,
            })
        })
        .collect();

    let sku_prefix: String = brand.chars().take(3).collect::<String>().to_uppercase();
    let keyword_count = fake.int_range(5, 15) as usize;
    let tag_count = fake.int_range(3, 10) as usize;

    json!({
        "id": id,
        "sku": format!("{}-{}", sku_prefix, fake.int_range(100_000, 999_999)),
        "name": format!("{} {}", brand, fake.title(3)),
        "description": fake.text(800),
        "short_description": fake.sentence(12),
        "category": {
            "primary": category,
            "subcategory": subcategory,
            "path": format!("{} > {}", category, subcategory),
        },
        "brand": brand,
        "price": {
            "current": fake.float(9.99, 999.99, 2),
            "original": fake.float(19.99, 1199.99, 2),
            "currency": "USD",
            "discount_percentage": if fake.bool_with_probability(0.3) { fake.int_range(0, 50) } else { 0 },
        },
        "inventory": {
            "stock_quantity": fake.int_range(0, 1000),
            "warehouse_location": fake.city(),
            "restock_date": maybe(fake, 0.2, |f| json!(f.date_within(30))),
            "low_stock_threshold": fake.int_range(5, 50),
        },
        "attributes": {
            "color": maybe(fake, 0.7, |f| json!(f.pick(COLORS))),
            "size": maybe(fake, 0.5, |f| json!(f.pick(SIZES))),
            "weight": format!("{} lbs", fake.float(0.1, 50.0, 2)),
            "dimensions": {
                "length": fake.float(1.0, 100.0, 1),
                "width": fake.float(1.0, 100.0, 1),
                "height": fake.float(1.0, 100.0, 1),
                "unit": "cm",
            },
            "material": maybe(fake, 0.6, |f| json!(title_case(f.word()))),
        },
        "specifications": specs,
        "images": images,
        "seo": {
            "meta_title": format!("{} {} - Best Price", brand, fake.title(3)),
            "meta_description": fake.text(160),
            "keywords": fake.words(keyword_count),
            "url_slug": fake.slug(),
        },
        "reviews": {
            "average_rating": fake.float(1.0, 5.0, 1),
            "total_reviews": review_count,
            "rating_distribution": {
                "5_star": fake.int_range(0, review_count),
                "4_star": fake.int_range(0, review_count),
                "3_star": fake.int_range(0, review_count),
                "2_star": fake.int_range(0, review_count),
                "1_star": fake.int_range(0, review_count),
            },
            "recent_reviews": recent_reviews,
        },
        "shipping": {
            "free_shipping": fake.bool_with_probability(0.4),
            "weight_class": fake.pick(WEIGHT_CLASSES),
            "shipping_cost": if fake.bool_with_probability(0.6) { fake.float(2.99, 29.99, 2) } else { 0.0 },
            "estimated_delivery": format!(
                "{}-{} business days",
                fake.int_range(1, 7),
                fake.int_range(5, 14)
            ),
        },
        "vendor": {
            "id": fake.uuid(),
            "name": fake.company_name(),
            "rating": fake.float(3.0, 5.0, 1),
            "location": fake.city(),
            "years_selling": fake.int_range(1, 20),
        },
        "tags": fake.words(tag_count),
        "status": fake.pick(PRODUCT_STATUSES),
        "created_at": fake.datetime_within(730),
        "updated_at": fake.datetime_within(30),
        "analytics": {
            "page_views": fake.int_range(0, 10_000),
            "unique_visitors": fake.int_range(0, 5000),
            "conversion_rate": fake.float(0.01, 0.15, 3),
            "bounce_rate": fake.float(0.2, 0.8, 2),
            "add_to_cart_rate": fake.float(0.05, 0.3, 3),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_product_shape() {
        let mut rng = CorpusRng::seed_from_u64(21);
        let doc = EcommerceFamily
            .generate("product", "product_0", &mut rng)
            .unwrap();
        assert_eq!(doc.id(), "product_0");

        let reviews = &doc.get("reviews").unwrap()["recent_reviews"];
        let total = doc.get("reviews").unwrap()["total_reviews"].as_i64().unwrap();
        assert_eq!(reviews.as_array().unwrap().len() as i64, total.min(10));

        let brand = doc.get("brand").and_then(Value::as_str).unwrap();
        let sku = doc.get("sku").and_then(Value::as_str).unwrap();
        assert!(sku.starts_with(&brand.chars().take(3).collect::<String>().to_uppercase()));
    }

    #[test]
    fn test_review_uses_given_id() {
        let mut rng = CorpusRng::seed_from_u64(4);
        let doc = EcommerceFamily
            .generate("review", "review_12", &mut rng)
            .unwrap();
        assert_eq!(doc.id(), "review_12");
        assert!(doc.get("product_id").is_some());
        let rating = doc.get("rating").and_then(Value::as_i64).unwrap();
        assert!((1..=5).contains(&rating));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("lorem"), "Lorem");
        assert_eq!(title_case(""), "");
    }
}
