//! `!roll [sides]`

use rand::Rng;

pub const DEFAULT_SIDES: u64 = 6;
pub const MIN_SIDES: u64 = 2;

/// Die size from the argument tail; junk falls back to the default
pub fn die_size(args: &[&str]) -> u64 {
    match args.join(" ").trim().parse::<i64>() {
        Ok(n) if n < MIN_SIDES as i64 => MIN_SIDES,
        Ok(n) => n as u64,
        Err(_) => DEFAULT_SIDES,
    }
}

pub fn roll_with<R: Rng>(rng: &mut R, args: &[&str]) -> String {
    let sides = die_size(args);
    let value = rng.gen_range(1..=sides);
    format!("You rolled a {} on a {}-sided die.", value, sides)
}

pub fn run(args: &[&str]) -> String {
    roll_with(&mut rand::thread_rng(), args)
}
