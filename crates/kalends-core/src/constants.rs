/// XML namespaces used in Clark-notation property names (`{ns}local`).
pub const NS_DAV: &str = "DAV:";
pub const NS_CALDAV: &str = "urn:ietf:params:xml:ns:caldav";
pub const NS_CARDDAV: &str = "urn:ietf:params:xml:ns:carddav";
pub const NS_CALENDARSERVER: &str = "http://calendarserver.org/ns/";
pub const NS_APPLE_ICAL: &str = "http://apple.com/ns/ical/";

pub const PROP_DISPLAYNAME: &str = const_str::concat!("{", NS_DAV, "}displayname");
pub const PROP_CALENDAR_DESCRIPTION: &str =
    const_str::concat!("{", NS_CALDAV, "}calendar-description");
pub const PROP_CALENDAR_TIMEZONE: &str = const_str::concat!("{", NS_CALDAV, "}calendar-timezone");
pub const PROP_SCHEDULE_CALENDAR_TRANSP: &str =
    const_str::concat!("{", NS_CALDAV, "}schedule-calendar-transp");
pub const PROP_CALENDAR_ORDER: &str = const_str::concat!("{", NS_APPLE_ICAL, "}calendar-order");
pub const PROP_CALENDAR_COLOR: &str = const_str::concat!("{", NS_APPLE_ICAL, "}calendar-color");
pub const PROP_REFRESHRATE: &str = const_str::concat!("{", NS_APPLE_ICAL, "}refreshrate");
pub const PROP_ADDRESSBOOK_DESCRIPTION: &str =
    const_str::concat!("{", NS_CARDDAV, "}addressbook-description");
pub const PROP_SUBSCRIPTION_SOURCE: &str = const_str::concat!("{", NS_CALENDARSERVER, "}source");
pub const PROP_STRIP_TODOS: &str =
    const_str::concat!("{", NS_CALENDARSERVER, "}subscribed-strip-todos");
pub const PROP_STRIP_ALARMS: &str =
    const_str::concat!("{", NS_CALENDARSERVER, "}subscribed-strip-alarms");
pub const PROP_STRIP_ATTACHMENTS: &str =
    const_str::concat!("{", NS_CALENDARSERVER, "}subscribed-strip-attachments");

/// Token value of a freshly created collection.
pub const INITIAL_SYNC_TOKEN: i64 = 1;

/// Prefix of the opaque sync-token and getctag values handed to clients.
pub const SYNC_TOKEN_PREFIX: &str = "http://sabre.io/ns/sync/";

/// Recurrence expansion stops here: 2038-01-01T00:00:00Z in Unix seconds.
pub const OCCURRENCE_HORIZON: i64 = 2_145_916_800;

/// Most instances walked for one recurrence set. A bounded rule that still
/// yields instances past this count is treated like an unbounded one.
pub const MAX_RECURRENCE_INSTANCES: usize = 0xFFFF;

/// Component set of a calendar created without an explicit one.
pub const DEFAULT_CALENDAR_COMPONENTS: &[&str] = &["VEVENT", "VTODO"];

/// Component set advertised for every subscription.
pub const SUBSCRIPTION_COMPONENTS: &[&str] = &["VTODO", "VEVENT"];
