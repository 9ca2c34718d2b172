/// Default bounded buffer size (in chunks) for unit inputs and outlets
pub const DEFAULT_HIGH_WATER_MARK: usize = 16;
/// Smallest usable buffer; a zero-capacity channel cannot carry anything
pub const MIN_HIGH_WATER_MARK: usize = 1;
/// Capacity of each unit's event bus before slow listeners start lagging
pub const EVENT_BUS_CAPACITY: usize = 64;
