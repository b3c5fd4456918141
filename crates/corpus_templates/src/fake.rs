//! Fake data generation helpers.
//!
//! Provides deterministic fake values (names, emails, places, text, timestamps)
//! drawn from fixed word pools. Every value is a pure function of the RNG
//! stream, so a seeded corpus is reproducible byte for byte.

use chrono::DateTime;
use rand::Rng;

/// First names for fake data
const FIRST_NAMES: &[&str] = &[
    "Alice", "Bob", "Carol", "David", "Emma", "Frank", "Grace", "Henry", "Iris", "Jack", "Kate",
    "Leo", "Maya", "Noah", "Olivia", "Peter", "Quinn", "Rose", "Sam", "Tara", "Uma", "Victor",
    "Wendy", "Xavier", "Yara", "Zack", "Anna", "Brian", "Clara", "Derek",
];

/// Last names for fake data
const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Martinez",
    "Anderson", "Taylor", "Thomas", "Moore", "Jackson", "Martin", "Lee", "Thompson", "White",
    "Harris", "Clark", "Lewis", "Robinson", "Walker", "Hall", "Young", "King", "Wright", "Hill",
];

/// Company name parts
const COMPANY_PREFIXES: &[&str] = &[
    "Acme", "Global", "Tech", "Prime", "Nova", "Alpha", "Beta", "Delta", "Omega", "Apex", "Peak",
    "Summit", "Core", "Edge", "Wave", "Flow", "Spark", "Swift", "Bright", "Clear",
];

const COMPANY_SUFFIXES: &[&str] = &[
    "Corp",
    "Inc",
    "LLC",
    "Systems",
    "Solutions",
    "Labs",
    "Group",
    "Industries",
    "Dynamics",
    "Works",
    "Digital",
    "Partners",
];

/// Cities paired with their country and ISO country code
const PLACES: &[(&str, &str, &str)] = &[
    ("New York", "United States", "US"),
    ("Chicago", "United States", "US"),
    ("Toronto", "Canada", "CA"),
    ("Vancouver", "Canada", "CA"),
    ("London", "United Kingdom", "GB"),
    ("Manchester", "United Kingdom", "GB"),
    ("Paris", "France", "FR"),
    ("Lyon", "France", "FR"),
    ("Berlin", "Germany", "DE"),
    ("Munich", "Germany", "DE"),
    ("Madrid", "Spain", "ES"),
    ("Lisbon", "Portugal", "PT"),
    ("Oslo", "Norway", "NO"),
    ("Stockholm", "Sweden", "SE"),
    ("Tokyo", "Japan", "JP"),
    ("Osaka", "Japan", "JP"),
    ("Sydney", "Australia", "AU"),
    ("Melbourne", "Australia", "AU"),
    ("Mumbai", "India", "IN"),
    ("Singapore", "Singapore", "SG"),
    ("Sao Paulo", "Brazil", "BR"),
    ("Mexico City", "Mexico", "MX"),
];

/// Region names
const REGIONS: &[&str] = &[
    "California", "Texas", "Ontario", "Bavaria", "Catalonia", "Kanto", "Queensland", "Scotland",
    "Brittany", "Lombardy",
];

const EMAIL_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "mail.test",
    "corp.test",
];

const TLDS: &[&str] = &["com", "net", "org", "io", "dev", "info"];

/// Lorem ipsum words for text generation
const LOREM_WORDS: &[&str] = &[
    "lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
    "enim",
    "ad",
    "minim",
    "veniam",
    "quis",
    "nostrud",
    "exercitation",
    "ullamco",
    "laboris",
    "nisi",
    "aliquip",
    "ex",
    "ea",
    "commodo",
    "consequat",
    "duis",
    "aute",
    "irure",
    "in",
    "reprehenderit",
    "voluptate",
    "velit",
    "esse",
    "cillum",
    "fugiat",
    "nulla",
    "pariatur",
    "excepteur",
    "sint",
    "occaecat",
    "cupidatat",
    "non",
    "proident",
    "sunt",
    "culpa",
    "qui",
    "officia",
    "deserunt",
    "mollit",
    "anim",
    "id",
    "est",
    "laborum",
];

/// Directory names used for fake file paths
const PATH_SEGMENTS: &[&str] = &[
    "var", "etc", "opt", "srv", "home", "data", "config", "logs", "reports", "exports", "tmp",
];

const FILE_EXTENSIONS: &[&str] = &["json", "yaml", "log", "csv", "txt", "conf", "db"];

/// Seconds since the Unix epoch for 2024-01-01T00:00:00Z.
///
/// All timestamps are offsets from this anchor rather than from the wall
/// clock, so seeded output does not depend on when it was generated.
pub const ANCHOR_EPOCH_SECS: i64 = 1_704_067_200;

pub(crate) const SECONDS_PER_DAY: i64 = 86_400;

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Access the underlying RNG for draws not covered by a helper
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Pick a random element from a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Pick up to `count` distinct elements, in draw order
    pub fn sample<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        let count = count.min(items.len());
        rand::seq::index::sample(&mut self.rng, items.len(), count)
            .into_iter()
            .map(|i| items[i].clone())
            .collect()
    }

    /// Generate a random integer in an inclusive range
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Generate a float in `[min, max)` rounded to `decimals` places
    pub fn float(&mut self, min: f64, max: f64, decimals: i32) -> f64 {
        let value = self.rng.random_range(min..max);
        let scale = 10f64.powi(decimals);
        (value * scale).round() / scale
    }

    /// Generate a boolean with given probability of true
    pub fn bool_with_probability(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Generate a random first name
    pub fn first_name(&mut self) -> &'static str {
        *self.pick(FIRST_NAMES)
    }

    /// Generate a random last name
    pub fn last_name(&mut self) -> &'static str {
        *self.pick(LAST_NAMES)
    }

    /// Generate a full name
    pub fn full_name(&mut self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    /// Generate an email address for a random person
    pub fn email(&mut self) -> String {
        let first = self.first_name();
        let last = self.last_name();
        let num: u32 = self.rng.random_range(1..1000);
        let domain = self.pick(EMAIL_DOMAINS);
        format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            num,
            domain
        )
    }

    /// Generate a user handle
    pub fn user_name(&mut self) -> String {
        let first = self.first_name().to_lowercase();
        let num: u32 = self.rng.random_range(1..10000);
        format!("{}{}", first, num)
    }

    /// Generate a company name
    pub fn company_name(&mut self) -> String {
        let prefix = self.pick(COMPANY_PREFIXES);
        let suffix = self.pick(COMPANY_SUFFIXES);
        format!("{} {}", prefix, suffix)
    }

    /// Generate a `(city, country, country_code)` triple
    pub fn place(&mut self) -> (&'static str, &'static str, &'static str) {
        *self.pick(PLACES)
    }

    pub fn city(&mut self) -> &'static str {
        self.place().0
    }

    pub fn country(&mut self) -> &'static str {
        self.place().1
    }

    pub fn country_code(&mut self) -> &'static str {
        self.place().2
    }

    pub fn region(&mut self) -> &'static str {
        *self.pick(REGIONS)
    }

    /// Generate a `(latitude, longitude)` pair with 6 decimal places
    pub fn coordinates(&mut self) -> (f64, f64) {
        (self.float(-90.0, 90.0, 6), self.float(-180.0, 180.0, 6))
    }

    /// Generate a dotted IPv4 address
    pub fn ipv4(&mut self) -> String {
        let octets: [u8; 4] = self.rng.random();
        format!("{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3])
    }

    /// Generate a domain name
    pub fn domain(&mut self) -> String {
        let word = self.word();
        let tld = self.pick(TLDS);
        format!("{}{}.{}", word, self.rng.random_range(1..100), tld)
    }

    /// Generate a URI path such as `/lorem/ipsum/dolor`
    pub fn uri_path(&mut self) -> String {
        let depth = self.rng.random_range(1..=3);
        (0..depth)
            .map(|_| format!("/{}", self.word()))
            .collect::<String>()
    }

    /// Generate an absolute URL
    pub fn url(&mut self) -> String {
        let domain = self.domain();
        let path = self.uri_path();
        format!("https://{}{}", domain, path)
    }

    /// Generate an image URL with the given dimensions
    pub fn image_url(&mut self, width: u32, height: u32) -> String {
        let id: u32 = self.rng.random_range(1..100_000);
        format!("https://images.example.com/{}x{}/{}.jpg", width, height, id)
    }

    /// Generate a filesystem path
    pub fn file_path(&mut self) -> String {
        let first = self.pick(PATH_SEGMENTS);
        let second = self.pick(PATH_SEGMENTS);
        let name = self.word();
        let ext = self.pick(FILE_EXTENSIONS);
        format!("/{}/{}/{}.{}", first, second, name, ext)
    }

    /// Generate a slug from random words
    pub fn slug(&mut self) -> String {
        let words = self.lorem(3).replace(' ', "-");
        let num: u32 = self.rng.random_range(1..10000);
        format!("{}-{}", words, num)
    }

    /// Generate a version-4 UUID string from the RNG stream
    pub fn uuid(&mut self) -> String {
        let bytes: [u8; 16] = self.rng.random();
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .hyphenated()
            .to_string()
    }

    /// Generate a lowercase hex token of `len` characters
    pub fn hex_token(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| {
                let nibble: u32 = self.rng.random_range(0..16);
                char::from_digit(nibble, 16).unwrap_or('0')
            })
            .collect()
    }

    /// Generate a single lorem word
    pub fn word(&mut self) -> &'static str {
        *self.pick(LOREM_WORDS)
    }

    /// Generate `count` lorem words
    pub fn words(&mut self, count: usize) -> Vec<&'static str> {
        (0..count).map(|_| self.word()).collect()
    }

    /// Generate lorem ipsum text
    pub fn lorem(&mut self, word_count: usize) -> String {
        self.words(word_count).join(" ")
    }

    /// Generate a capitalized title of `word_count` words without trailing period
    pub fn title(&mut self, word_count: usize) -> String {
        let mut text = self.lorem(word_count);
        if let Some(first) = text.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        text
    }

    /// Generate a sentence (capitalized, with period)
    pub fn sentence(&mut self, word_count: usize) -> String {
        let mut text = self.title(word_count);
        text.push('.');
        text
    }

    /// Generate a sentence of 5 to 14 words
    pub fn any_sentence(&mut self) -> String {
        let word_count = self.rng.random_range(5..15);
        self.sentence(word_count)
    }

    /// Generate a paragraph
    pub fn paragraph(&mut self, sentence_count: usize) -> String {
        let mut sentences = Vec::with_capacity(sentence_count);
        for _ in 0..sentence_count {
            sentences.push(self.any_sentence());
        }
        sentences.join(" ")
    }

    /// Generate a paragraph of 3 to 6 sentences
    pub fn any_paragraph(&mut self) -> String {
        let sentence_count = self.rng.random_range(3..7);
        self.paragraph(sentence_count)
    }

    /// Generate `count` paragraphs joined by a space
    pub fn paragraphs(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| self.any_paragraph())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Generate text of at most `max_chars` characters, cut at a word boundary
    pub fn text(&mut self, max_chars: usize) -> String {
        let mut text = String::with_capacity(max_chars);
        loop {
            let sentence = self.any_sentence();
            let needed = if text.is_empty() {
                sentence.len()
            } else {
                sentence.len() + 1
            };
            if text.len() + needed > max_chars {
                break;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&sentence);
        }
        if text.is_empty() {
            text = self.word().to_string();
        }
        text
    }

    /// Generate an ISO 8601 timestamp within `days_back` days before the anchor
    pub fn datetime_within(&mut self, days_back: i64) -> String {
        let offset = self.rng.random_range(0..days_back.max(1) * SECONDS_PER_DAY);
        format_timestamp(ANCHOR_EPOCH_SECS - offset)
    }

    /// Generate an ISO 8601 date within `days_back` days before the anchor
    pub fn date_within(&mut self, days_back: i64) -> String {
        let offset = self.rng.random_range(0..days_back.max(1) * SECONDS_PER_DAY);
        format_date(ANCHOR_EPOCH_SECS - offset)
    }

    /// Generate epoch seconds within `days_back` days before the anchor
    pub fn epoch_within(&mut self, days_back: i64) -> i64 {
        ANCHOR_EPOCH_SECS - self.rng.random_range(0..days_back.max(1) * SECONDS_PER_DAY)
    }
}

/// Format epoch seconds as `YYYY-MM-DDTHH:MM:SS`
pub fn format_timestamp(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Format epoch seconds as `YYYY-MM-DD`
pub fn format_date(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Format epoch seconds as an hourly bucket, `YYYY-MM-DD-HH`
pub fn format_hour_bucket(epoch_secs: i64) -> String {
    DateTime::from_timestamp(epoch_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d-%H").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_deterministic_generation() {
        let mut fake1 = FakeData::new(ChaCha8Rng::seed_from_u64(42));
        let mut fake2 = FakeData::new(ChaCha8Rng::seed_from_u64(42));

        // Same seed should produce same results
        assert_eq!(fake1.full_name(), fake2.full_name());
        assert_eq!(fake1.company_name(), fake2.company_name());
        assert_eq!(fake1.uuid(), fake2.uuid());
        assert_eq!(fake1.paragraph(3), fake2.paragraph(3));
    }

    #[test]
    fn test_pool_values_are_static_strs() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(5));
        let first: &'static str = fake.first_name();
        let last: &'static str = fake.last_name();
        let region: &'static str = fake.region();
        let word: &'static str = fake.word();
        assert!(FIRST_NAMES.contains(&first));
        assert!(LAST_NAMES.contains(&last));
        assert!(REGIONS.contains(&region));
        assert!(LOREM_WORDS.contains(&word));
    }

    #[test]
    fn test_email_generation() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(42));
        let email = fake.email();
        assert_eq!(email.matches('@').count(), 1);
        assert!(EMAIL_DOMAINS.iter().any(|d| email.ends_with(d)));
    }

    #[test]
    fn test_float_precision() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(42));
        let price = fake.float(10.0, 100.0, 2);
        assert_eq!(price, (price * 100.0).round() / 100.0);
        assert!((10.0..=100.0).contains(&price));
    }

    #[test]
    fn test_sample_is_distinct_and_clamped() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(7));
        let picked = fake.sample(LOREM_WORDS, 10);
        let mut deduped = picked.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(picked.len(), 10);
        assert_eq!(deduped.len(), 10);

        let all = fake.sample(&[1, 2, 3], 10);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_text_respects_max_chars() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(3));
        for max in [20, 160, 800] {
            let text = fake.text(max);
            assert!(!text.is_empty());
            assert!(text.len() <= max, "{} > {}", text.len(), max);
        }
    }

    #[test]
    fn test_timestamps_are_anchored() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(1));
        let ts = fake.datetime_within(7);
        assert!(ts.as_str() <= "2024-01-01T00:00:00");
        assert!(ts.as_str() > "2023-12-25");
        assert_eq!(format_timestamp(ANCHOR_EPOCH_SECS), "2024-01-01T00:00:00");
        assert_eq!(format_date(ANCHOR_EPOCH_SECS), "2024-01-01");
        assert_eq!(format_hour_bucket(ANCHOR_EPOCH_SECS - 1), "2023-12-31-23");
    }

    #[test]
    fn test_uuid_shape() {
        let mut fake = FakeData::new(ChaCha8Rng::seed_from_u64(9));
        let id = fake.uuid();
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().nth(14), Some('4'));
    }
}
