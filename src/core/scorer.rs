//! Competition scoring - Pure functions that rank videos for a settlement period.
//!
//! `score = likes * 3 + average_rating * 10 + views * 0.1`, always in `f64`.
//! Ties keep the video seen first: the leader only changes on a strictly greater score.

use crate::entities::competition_video;

/// Weight of one like
pub const LIKE_WEIGHT: f64 = 3.0;
/// Weight of one rating point
pub const RATING_WEIGHT: f64 = 10.0;
/// Weight of one view
pub const VIEW_WEIGHT: f64 = 0.1;

/// Computes the competition score from raw engagement metrics.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::suboptimal_flops)]
pub fn score(likes_count: i64, average_rating: f64, views: i64) -> f64 {
    // Unfused so every score rounds identically.
    likes_count as f64 * LIKE_WEIGHT + average_rating * RATING_WEIGHT + views as f64 * VIEW_WEIGHT
}

/// Computes the competition score of a stored video.
#[must_use]
pub fn score_video(video: &competition_video::Model) -> f64 {
    score(video.likes_count, video.average_rating, video.views)
}

/// Index and score of the highest entry, first-seen on ties.
///
/// Non-finite scores never lead.
#[must_use]
pub fn pick_highest<I>(scores: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = f64>,
{
    let mut leader: Option<(usize, f64)> = None;
    for (index, candidate) in scores.into_iter().enumerate() {
        if !candidate.is_finite() {
            continue;
        }
        match leader {
            Some((_, best)) if candidate <= best => {}
            _ => leader = Some((index, candidate)),
        }
    }
    leader
}

/// The video a settlement would pick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredVideo<'a> {
    /// Position in the scanned slice
    pub index: usize,
    /// The winning video
    pub video: &'a competition_video::Model,
    /// Its score
    pub score: f64,
}

/// Scans videos in the given order and returns the winner.
#[must_use]
pub fn select_winner(videos: &[competition_video::Model]) -> Option<ScoredVideo<'_>> {
    pick_highest(videos.iter().map(score_video)).map(|(index, score)| ScoredVideo {
        index,
        video: &videos[index],
        score,
    })
}
