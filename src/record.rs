//! Game record as stored in the JSON Lines source.
//!
//! Only `id` is mandatory; every statistic may be missing from a line, which
//! matters for ranking (records without the ranked field are filtered out).

use serde::{Deserialize, Serialize};

/// One cannon position: `[column, row]`, columns are 1-based.
pub type Cannon = Vec<i64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: i64,

    #[serde(default)]
    pub cannons: Vec<Cannon>,
    #[serde(default)]
    pub escaped_ships: Option<i64>,
    #[serde(default)]
    pub getcannons_received: Option<i64>,
    #[serde(default)]
    pub getturn_received: Option<i64>,
    #[serde(default)]
    pub last_turn: Option<i64>,
    #[serde(default)]
    pub remaining_life_on_escaped_ships: Option<i64>,
    #[serde(default)]
    pub ship_moves: Option<i64>,
    #[serde(default)]
    pub shot_received: Option<i64>,
    #[serde(default)]
    pub sunk_ships: Option<i64>,
    #[serde(default)]
    pub tstamp_auth_completion: Option<f64>,
    #[serde(default)]
    pub tstamp_auth_start: Option<f64>,
    #[serde(default)]
    pub tstamp_completion: Option<f64>,
    #[serde(default)]
    pub valid_shots: Option<i64>,

    /// Opaque credential of the player; published as `gas`.
    #[serde(default)]
    pub auth: Option<String>,
}

impl GameRecord {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            cannons: Vec::new(),
            escaped_ships: None,
            getcannons_received: None,
            getturn_received: None,
            last_turn: None,
            remaining_life_on_escaped_ships: None,
            ship_moves: None,
            shot_received: None,
            sunk_ships: None,
            tstamp_auth_completion: None,
            tstamp_auth_start: None,
            tstamp_completion: None,
            valid_shots: None,
            auth: None,
        }
    }

    pub fn parse_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

/// Statistics block of a lookup response (`game_stats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    #[serde(default)]
    pub cannons: Vec<Cannon>,
    pub escaped_ships: Option<i64>,
    pub getcannons_received: Option<i64>,
    pub getturn_received: Option<i64>,
    pub last_turn: Option<i64>,
    pub remaining_life_on_escaped_ships: Option<i64>,
    pub ship_moves: Option<i64>,
    pub shot_received: Option<i64>,
    pub sunk_ships: Option<i64>,
    pub tstamp_auth_completion: Option<f64>,
    pub tstamp_auth_start: Option<f64>,
    pub tstamp_completion: Option<f64>,
    pub valid_shots: Option<i64>,
    pub gas: Option<String>,
}

/// Full lookup response body: `{game_id, game_stats}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: i64,
    pub game_stats: GameStats,
}

impl From<&GameRecord> for GameView {
    fn from(r: &GameRecord) -> Self {
        GameView {
            game_id: r.id,
            game_stats: GameStats {
                cannons: r.cannons.clone(),
                escaped_ships: r.escaped_ships,
                getcannons_received: r.getcannons_received,
                getturn_received: r.getturn_received,
                last_turn: r.last_turn,
                remaining_life_on_escaped_ships: r.remaining_life_on_escaped_ships,
                ship_moves: r.ship_moves,
                shot_received: r.shot_received,
                sunk_ships: r.sunk_ships,
                tstamp_auth_completion: r.tstamp_auth_completion,
                tstamp_auth_start: r.tstamp_auth_start,
                tstamp_completion: r.tstamp_completion,
                valid_shots: r.valid_shots,
                gas: r.auth.clone(),
            },
        }
    }
}
