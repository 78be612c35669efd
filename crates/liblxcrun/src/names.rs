//! Human readable names for containers started without one

const ADJECTIVES: &[&str] = &[
    "Agile", "Amber", "Bold", "Brave", "Breezy", "Bright", "Calm", "Clever", "Cosmic", "Crisp",
    "Curious", "Dapper", "Dizzy", "Eager", "Fancy", "Fluffy", "Fuzzy", "Gentle", "Giddy",
    "Glossy", "Happy", "Hasty", "Humble", "Jolly", "Lucky", "Mellow", "Merry", "Misty", "Nimble",
    "Noisy", "Plucky", "Quiet", "Quirky", "Rapid", "Rusty", "Shiny", "Silly", "Sleepy", "Snappy",
    "Sneaky", "Sunny", "Swift", "Tidy", "Tiny", "Wacky", "Witty", "Zany", "Zesty",
];

const NOUNS: &[&str] = &[
    "Badger", "Beacon", "Bison", "Biscuit", "Comet", "Cricket", "Dingo", "Falcon", "Ferret",
    "Gecko", "Goblin", "Heron", "Jackal", "Koala", "Lemur", "Lynx", "Marmot", "Meteor", "Moose",
    "Narwhal", "Newt", "Ocelot", "Otter", "Panda", "Pebble", "Pelican", "Penguin", "Pickle",
    "Puffin", "Quokka", "Raven", "Rocket", "Salmon", "Sparrow", "Squid", "Tapir", "Toucan",
    "Turnip", "Walrus", "Wombat", "Yak", "Zebra",
];

/// Picks an adjective and a noun, e.g. `SnappyOtter`
pub fn random_name() -> String {
    let adjective = ADJECTIVES[fastrand::usize(..ADJECTIVES.len())];
    let noun = NOUNS[fastrand::usize(..NOUNS.len())];
    format!("{adjective}{noun}")
}
