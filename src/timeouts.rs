pub mod ms {
    pub const PAGE_DELAY: u64 = 1000;
}

pub mod secs {
    pub const REQUEST: u64 = 30;
    pub const RATE_LIMIT_COOLDOWN: u64 = 60;
}
