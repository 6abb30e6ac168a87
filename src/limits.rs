/// First bookable minute of the day (08:00).
pub const OPENS_AT_MINUTE: u32 = 8 * 60;

/// Last bookable minute of the day (17:00), inclusive.
pub const CLOSES_AT_MINUTE: u32 = 17 * 60;

/// Bookings may be made up to this many calendar days after today.
pub const BOOKING_WINDOW_DAYS: i64 = 5;

/// Business days covered by the weekly report.
pub const REPORT_BUSINESS_DAYS: usize = 5;

/// Capacity of the channel feeding the WAL writer.
pub const WAL_CHANNEL_CAPACITY: usize = 4096;

/// Upper bound on one encoded slot event. A label, a date and a time fit in
/// well under a hundred bytes; anything larger on disk is corruption.
pub const MAX_ENTRY_BYTES: u32 = 4096;

/// How often seeding tops up the rolling business week.
pub const RESEED_EVERY_SECS: u64 = 60 * 60;
