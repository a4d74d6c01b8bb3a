use linkstash_core::UrlStorage;
use linkstash_generator::RandomGenerator;
use linkstash_shortener::ShortenerService;

/// The service type the gateway runs, with the backend chosen at startup.
pub type Shortener = ShortenerService<dyn UrlStorage, RandomGenerator>;

#[derive(Clone)]
pub struct AppState {
    shortener: Shortener,
}

impl AppState {
    pub fn new(shortener: Shortener) -> Self {
        Self { shortener }
    }

    pub fn shortener(&self) -> &Shortener {
        &self.shortener
    }
}
