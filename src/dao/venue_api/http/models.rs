use serde::Serialize;

use crate::dao::models::{MatchResultEntity, MatchType};

#[derive(Debug, Serialize)]
pub struct VenueQuery<'a> {
    pub place: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AddPlayerBody<'a> {
    pub place: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenamePlayerBody<'a> {
    pub place: &'a str,
    pub new_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MatchResultBody<'a> {
    pub place: &'a str,
    pub player1_name: &'a str,
    pub player1_score: u32,
    pub player2_name: &'a str,
    pub player2_score: u32,
    pub match_time: u64,
    pub match_type: MatchType,
}

impl<'a> MatchResultBody<'a> {
    pub fn new(place: &'a str, result: &'a MatchResultEntity) -> Self {
        Self {
            place,
            player1_name: &result.player1_name,
            player1_score: result.player1_score,
            player2_name: &result.player2_name,
            player2_score: result.player2_score,
            match_time: result.match_time,
            match_type: result.match_type,
        }
    }
}
