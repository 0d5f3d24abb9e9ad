//! Reply text for every command outcome.

use std::collections::BTreeMap;
use std::fmt::Write;

use solvedac::UserStats;

use super::{Command, ParseError};
use crate::Error;
use crate::domain::{Handle, StatsDelta};

/// First line of the `!update` report.
pub const UPDATE_HEADER: &str = "모든 등록된 백준 ID의 통계가 업데이트되었습니다:";

/// Shown instead of a percentage when the stored rating is zero.
pub const NOT_AVAILABLE: &str = "N/A";

pub fn lookup(handle: &Handle, stats: UserStats) -> String {
    format!(
        "백준 ID {handle}의 통계입니다:\n총 풀린 문제 수: {}\n현재 레이팅: {}",
        stats.solved_count, stats.rating
    )
}

pub fn already_registered(handle: &Handle) -> String {
    format!("백준 ID {handle}는 이미 등록되었습니다.")
}

pub fn registered(handle: &Handle, stats: UserStats) -> String {
    format!(
        "백준 ID {handle}의 통계가 파일에 저장되었습니다.\n총 풀린 문제 수: {}\n현재 레이팅: {}",
        stats.solved_count, stats.rating
    )
}

/// Header followed by one block per handle, in map order.
pub fn update_report(updated: &BTreeMap<Handle, UserStats>) -> String {
    let mut out = format!("{UPDATE_HEADER}\n");
    for (handle, stats) in updated {
        let _ = write!(
            out,
            "{handle}:\n총 풀린 문제 수: {}\n현재 레이팅: {}\n\n",
            stats.solved_count, stats.rating
        );
    }
    out
}

pub fn not_registered(handle: &Handle) -> String {
    format!("백준 ID {handle}는 등록되어 있지 않습니다. 먼저 !r 명령어로 등록해 주세요.")
}

pub fn comparison(handle: &Handle, current: UserStats, delta: &StatsDelta) -> String {
    format!(
        "백준 ID {handle}의 현재 통계입니다:\n\
         총 풀린 문제 수: {}\n\
         현재 레이팅: {}\n\n\
         일요일 이후 증가량:\n\
         풀린 문제 수: {}\n\
         레이팅 증가량: {}, {}",
        current.solved_count,
        current.rating,
        delta.solved,
        delta.rating,
        rating_percent(delta.rating_percent),
    )
}

pub fn load_failed(handle: &Handle) -> String {
    format!("백준 ID {handle}의 등록된 정보를 불러오는 데 실패했습니다.")
}

pub fn parse_error(error: &ParseError) -> String {
    match error {
        ParseError::MissingArgument { command } => {
            format!("백준 ID를 입력해 주세요. 사용법: {command} <백준 ID>")
        }
        ParseError::InvalidHandle { command, reason } => {
            format!("{command}: 올바르지 않은 백준 ID입니다 ({reason})")
        }
    }
}

/// One-line diagnostic for a command that failed while running.
pub fn command_failed(command: &Command, error: &Error) -> String {
    let summary = match error {
        Error::Stats(_) => "solved.ac 조회에 실패했습니다",
        Error::Serialization(_) => "저장된 정보가 손상되었습니다",
        Error::Io(_) | Error::IoPath { .. } => "파일 저장소 작업에 실패했습니다",
        _ => "명령을 처리하지 못했습니다",
    };
    match command.handle() {
        Some(handle) => format!("{} {handle}: {summary}. ({error})", command.name()),
        None => format!("{}: {summary}. ({error})", command.name()),
    }
}

fn rating_percent(percent: Option<f64>) -> String {
    match percent {
        Some(percent) => format!("{percent:.2}%"),
        None => NOT_AVAILABLE.to_string(),
    }
}
