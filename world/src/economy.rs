use std::collections::VecDeque;

const SCORE_PER_KILL: u64 = 10;
const SCORE_PER_BATTLE_SECOND: u64 = 1;
const SCORE_PER_WAVE: u64 = 100;

/// Gold, session score, and the recent kill log.
#[derive(Debug)]
pub(crate) struct Economy {
    gold: u32,
    gold_carry: f32,
    score: u64,
    score_carry: f32,
    total_kills: u32,
    kill_log: VecDeque<String>,
    kill_log_capacity: usize,
}

impl Economy {
    pub(crate) fn new(kill_log_capacity: usize) -> Self {
        Self {
            gold: 0,
            gold_carry: 0.0,
            score: 0,
            score_carry: 0.0,
            total_kills: 0,
            kill_log: VecDeque::with_capacity(kill_log_capacity),
            kill_log_capacity,
        }
    }

    pub(crate) fn gold(&self) -> u32 {
        self.gold
    }

    pub(crate) fn score(&self) -> u64 {
        self.score
    }

    pub(crate) fn total_kills(&self) -> u32 {
        self.total_kills
    }

    pub(crate) fn kill_log(&self) -> impl Iterator<Item = &str> {
        self.kill_log.iter().map(String::as_str)
    }

    pub(crate) fn grant_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    pub(crate) fn try_spend(&mut self, amount: u32) -> bool {
        match self.gold.checked_sub(amount) {
            Some(remaining) => {
                self.gold = remaining;
                true
            }
            None => false,
        }
    }

    /// Accrues gold and time score for a slice of battle; returns whether gold changed.
    pub(crate) fn accrue_battle_time(&mut self, dt: f32, gold_per_second: u32) -> bool {
        self.gold_carry += dt * gold_per_second as f32;
        let whole_gold = self.gold_carry.floor();
        self.gold_carry -= whole_gold;

        self.score_carry += dt;
        let whole_seconds = self.score_carry.floor();
        self.score_carry -= whole_seconds;
        self.score = self
            .score
            .saturating_add(whole_seconds as u64 * SCORE_PER_BATTLE_SECOND);

        if whole_gold >= 1.0 {
            self.grant_gold(whole_gold as u32);
            return true;
        }
        false
    }

    pub(crate) fn restore_kills(&mut self, total_kills: u32) {
        self.total_kills = total_kills;
    }

    pub(crate) fn record_enemy_kill(&mut self) {
        self.total_kills = self.total_kills.saturating_add(1);
        self.score = self.score.saturating_add(SCORE_PER_KILL);
    }

    pub(crate) fn record_wave_cleared(&mut self) {
        self.score = self.score.saturating_add(SCORE_PER_WAVE);
    }

    pub(crate) fn log_kill(&mut self, entry: String) {
        if self.kill_log_capacity == 0 {
            return;
        }
        while self.kill_log.len() >= self.kill_log_capacity {
            let _ = self.kill_log.pop_front();
        }
        self.kill_log.push_back(entry);
    }
}
