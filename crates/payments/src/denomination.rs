//! Accepted coin and note denominations.

use serde::{Deserialize, Serialize};

use vendo_core::Money;

/// Coin denominations, valued in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coin {
    Penny,
    Nickel,
    Dime,
    Quarter,
    HalfDollar,
    Dollar,
}

impl Coin {
    pub const ALL: [Coin; 6] = [
        Coin::Penny,
        Coin::Nickel,
        Coin::Dime,
        Coin::Quarter,
        Coin::HalfDollar,
        Coin::Dollar,
    ];

    pub const fn value(self) -> Money {
        let minor = match self {
            Coin::Penny => 1,
            Coin::Nickel => 5,
            Coin::Dime => 10,
            Coin::Quarter => 25,
            Coin::HalfDollar => 50,
            Coin::Dollar => 100,
        };
        Money::from_minor(minor)
    }
}

/// Note (bill) denominations, valued in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Note {
    One,
    Five,
    Ten,
    Twenty,
    Fifty,
    Hundred,
}

impl Note {
    pub const ALL: [Note; 6] = [
        Note::One,
        Note::Five,
        Note::Ten,
        Note::Twenty,
        Note::Fifty,
        Note::Hundred,
    ];

    pub const fn value(self) -> Money {
        let minor = match self {
            Note::One => 100,
            Note::Five => 500,
            Note::Ten => 1_000,
            Note::Twenty => 2_000,
            Note::Fifty => 5_000,
            Note::Hundred => 10_000,
        };
        Money::from_minor(minor)
    }
}
