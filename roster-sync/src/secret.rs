//! Memorable first-login passwords: `<Word>.<NNNN>`.
//!
//! The output space is `WORDS.len() × 10_000` (a little over a million).
//! These are easy for young students to type and remember and are meant to be
//! changed; they are not high-entropy secrets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Placeholder shown wherever a secret would otherwise be logged or displayed.
pub const SECRET_MASK: &str = "********";

/// Capitalized nouns: animals, colors, simple objects.
pub const WORDS: &[&str] = &[
    // animals
    "Ant", "Bat", "Bear", "Bee", "Camel", "Cat", "Crab", "Crow", "Deer", "Dog",
    "Dolphin", "Duck", "Eagle", "Emu", "Fox", "Frog", "Goat", "Goose", "Hawk", "Horse",
    "Koala", "Lamb", "Lion", "Llama", "Mole", "Moose", "Mouse", "Otter", "Owl", "Panda",
    "Parrot", "Penguin", "Pig", "Pony", "Puffin", "Rabbit", "Seal", "Shark", "Sheep", "Snail",
    "Swan", "Tiger", "Turtle", "Whale", "Wolf", "Wombat", "Yak", "Zebra",
    // colors
    "Amber", "Aqua", "Black", "Blue", "Bronze", "Coral", "Cream", "Gold", "Green", "Grey",
    "Indigo", "Ivory", "Lemon", "Lilac", "Lime", "Maroon", "Mint", "Navy", "Olive", "Orange",
    "Peach", "Pink", "Purple", "Red", "Ruby", "Silver", "Teal", "Violet", "White", "Yellow",
    // objects
    "Anchor", "Apple", "Ball", "Banana", "Basket", "Bell", "Boat", "Book", "Bucket", "Button",
    "Candle", "Castle", "Chair", "Cloud", "Cookie", "Crayon", "Drum", "Feather", "Flag", "Garden",
    "Guitar", "Hammer", "Island", "Kettle", "Kite", "Ladder", "Lamp", "Mango", "Mirror", "Moon",
    "Orbit", "Paddle", "Pear", "Pencil", "Piano", "Pillow", "Planet", "Rocket", "Sandal", "Spoon",
    "Star", "Teapot", "Tent", "Train", "Trumpet", "Tulip", "Violin", "Wagon", "Window", "Yoyo",
];

/// Something that can mint a fresh secret. Injected into the
/// [`Provisioner`](crate::Provisioner) at construction.
pub trait SecretSource {
    fn generate_secret(&mut self) -> String;
}

/// Uniform word + uniform 4-digit number, drawn from an injected RNG.
#[derive(Debug, Clone)]
pub struct SecretGenerator<R = StdRng> {
    rng: R,
}

impl SecretGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Deterministic generator for tests and reproducible dry runs.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SecretGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn generate(&mut self) -> String {
        let word = WORDS[self.rng.gen_range(0..WORDS.len())];
        let number = self.rng.gen_range(0..=9999u16);
        format_secret(word, number)
    }
}

impl<R: Rng> SecretSource for SecretGenerator<R> {
    fn generate_secret(&mut self) -> String {
        self.generate()
    }
}

/// `"Word.0007"` — the number is always zero-padded to four digits.
pub fn format_secret(word: &str, number: u16) -> String {
    format!("{word}.{number:04}")
}
