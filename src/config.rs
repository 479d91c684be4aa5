//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 환경변수에서 서버 설정값을 읽어오는 모듈입니다.
//! `.env` 파일이나 시스템 환경변수에서 값을 가져옵니다.
//!
//! 설정 항목:
//! - `DATABASE_URL`: SQLite 데이터베이스 경로 (필수)
//! - `JWT_SECRET`: 액세스 토큰 검증에 사용할 비밀키 (필수)
//! - `HOST`: 서버 바인딩 주소
//! - `PORT`: 서버 포트 번호
//! - `WEIGHT_UNIT`: 개인 기록(PR)에 기록할 무게 단위 (기본 "kg")
//! - `SESSION_HISTORY_LIMIT`: 세션 목록 기본 조회 개수
//! - `MEASUREMENT_HISTORY_LIMIT`: 신체 측정 목록 기본 조회 개수
//! - `REST_TICK_MILLIS`: 휴식 카운트다운 틱 간격 (밀리초)
//! - `LIVE_SESSION_IDLE_MINUTES`: 조작 없이 이 시간이 지나면 라이브 세션을 닫습니다

use std::env;

/// 애플리케이션 전체 설정을 담는 구조체
///
/// 서버 시작 시 환경변수에서 한 번 읽어온 후,
/// 애플리케이션 전체에서 공유됩니다.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite 데이터베이스 파일 경로 (예: "sqlite:data/fittrack.db")
    pub database_url: String,
    /// JWT 토큰 검증에 사용하는 비밀키
    pub jwt_secret: String,
    /// 서버가 바인딩할 호스트 주소 (기본값: "0.0.0.0")
    pub host: String,
    /// 서버 포트 번호 (기본값: 3000)
    pub port: u16,
    /// 무게 단위. 원본 앱은 항상 "kg"으로 기록했습니다.
    pub weight_unit: String,
    /// `GET /sessions`의 기본 limit (기본값: 50)
    pub session_history_limit: i64,
    /// `GET /measurements`의 기본 limit (기본값: 100)
    pub measurement_history_limit: i64,
    /// 휴식 카운트다운 한 틱의 길이. 운영에서는 1초, 테스트에서 줄일 수 있습니다.
    pub rest_tick_millis: u64,
    /// 라이브 세션 유휴 만료 시간(분, 기본값: 120)
    pub live_session_idle_minutes: u64,
}

impl Config {
    /// 환경변수에서 설정값을 읽어 Config 인스턴스를 생성합니다.
    ///
    /// # 에러
    /// `DATABASE_URL`과 `JWT_SECRET`은 필수이며, 없으면 에러가 발생합니다.
    /// 나머지 설정은 기본값이 있어 환경변수가 없어도 동작합니다.
    /// 숫자 설정의 파싱에 실패하면 조용히 기본값을 사용합니다.
    pub fn from_env() -> Result<Self, env::VarError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")?, // 필수: 없으면 에러
            jwt_secret: env::var("JWT_SECRET")?,     // 필수: 없으면 에러
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000),
            weight_unit: env::var("WEIGHT_UNIT").unwrap_or_else(|_| "kg".to_string()),
            session_history_limit: parse_or("SESSION_HISTORY_LIMIT", 50),
            measurement_history_limit: parse_or("MEASUREMENT_HISTORY_LIMIT", 100),
            rest_tick_millis: parse_or("REST_TICK_MILLIS", 1000),
            live_session_idle_minutes: parse_or("LIVE_SESSION_IDLE_MINUTES", 120),
        })
    }
}

/// 환경변수를 읽어 파싱하고, 없거나 형식이 틀리면 기본값을 돌려줍니다.
///
/// 제네릭 `T: FromStr`: `"3000".parse::<u16>()`처럼 문자열에서 만들 수 있는 모든 타입에 동작합니다.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}
