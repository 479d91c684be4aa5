//! # 라이브 운동 세션
//!
//! 진행 중인 세션 하나마다 tokio 태스크 하나가 `WorkoutSessionRunner`를 단독으로 소유합니다.
//! 외부(HTTP 핸들러)는 `LiveSessionHandle`을 통해 명령을 보내고 `oneshot`으로 응답을 받습니다.
//!
//! ```text
//! 핸들러 ──Command──▶ [mpsc] ──▶ 세션 태스크 ──▶ WorkoutSessionRunner
//!                                   ▲   │
//!                 휴식 틱(interval) ─┘   └─ spawn: 개인 기록 판정 ──▶ [mpsc] ──┘
//! ```
//!
//! 태스크는 명령을 한 번에 하나씩 끝까지 처리하므로 상태 머신에 잠금이 필요 없습니다.
//! 개인 기록 판정은 별도 태스크에서 돌고, 결과는 세션이 아직 살아 있을 때만 알림으로 반영됩니다.
//! `finish`가 성공하거나, 세션이 포기(abandon)되거나, 유휴 시간 동안 명령이 없으면 태스크가 끝나고
//! 끝나는 태스크는 스스로 목록에서 빠집니다.

use crate::error::AppError;
use crate::services::session_runner::{
    ExerciseCatalog, PersonalRecordChecker, RecordCandidate, SessionError, SessionSink,
    SessionSnapshot, SetCompletion, SetEntry, WorkoutDefinition, WorkoutSessionRunner,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::{Instant, MissedTickBehavior};

/// 세션 태스크의 명령 대기열 크기
const COMMAND_BUFFER: usize = 16;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;
type Registry = Mutex<HashMap<String, LiveSessionHandle>>;

enum Command {
    Start(Reply<LiveSessionView>),
    Pause(Reply<LiveSessionView>),
    Resume(Reply<LiveSessionView>),
    CompleteSet(SetEntry, Reply<SetOutcome>),
    Finish(Reply<String>),
    Snapshot(Reply<LiveSessionView>),
    Abandon(Reply<()>),
}

/// 새 개인 기록 알림
#[derive(Debug, Clone, Serialize)]
pub struct RecordNotification {
    pub exercise_id: String,
    pub exercise_name: String,
    pub value: f64,
    pub unit: String,
    pub achieved_at: DateTime<Utc>,
}

/// `GET /live-sessions/{id}` 응답
#[derive(Debug, Clone, Serialize)]
pub struct LiveSessionView {
    pub id: String,
    #[serde(flatten)]
    pub session: SessionSnapshot,
    pub notifications: Vec<RecordNotification>,
}

/// 세트 완료 응답: 방금 완료한 세트와 그 뒤의 세션 상태
#[derive(Debug, Clone, Serialize)]
pub struct SetOutcome {
    pub completion: SetCompletion,
    pub session: LiveSessionView,
}

/// 세션 태스크와 통신하는 핸들. 복제해서 여러 요청이 동시에 써도 됩니다.
#[derive(Clone)]
pub struct LiveSessionHandle {
    id: String,
    user_id: String,
    commands: mpsc::Sender<Command>,
}

impl LiveSessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn start(&self) -> Result<LiveSessionView, AppError> {
        self.request(Command::Start).await
    }

    pub async fn pause(&self) -> Result<LiveSessionView, AppError> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<LiveSessionView, AppError> {
        self.request(Command::Resume).await
    }

    pub async fn complete_set(&self, entry: SetEntry) -> Result<SetOutcome, AppError> {
        self.request(|reply| Command::CompleteSet(entry, reply)).await
    }

    /// 세션을 끝내고 저장된 세션 ID를 돌려줍니다. 성공하면 세션 태스크는 종료됩니다.
    pub async fn finish(&self) -> Result<String, AppError> {
        self.request(Command::Finish).await
    }

    pub async fn snapshot(&self) -> Result<LiveSessionView, AppError> {
        self.request(Command::Snapshot).await
    }

    /// 기록을 남기지 않고 세션을 버립니다.
    pub async fn abandon(&self) -> Result<(), AppError> {
        self.request(Command::Abandon).await
    }

    /// 태스크가 이미 끝났으면(완료 또는 포기) 404로 취급합니다.
    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, AppError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| AppError::NotFound)?;
        let result = response.await.map_err(|_| AppError::NotFound)?;
        Ok(result?)
    }
}

/// 진행 중인 세션 목록 (라이브 세션 ID → 핸들)
#[derive(Clone)]
pub struct LiveSessions {
    sessions: Arc<Registry>,
    /// 마지막 명령 이후 이 시간이 지나면 세션 태스크가 스스로 끝납니다.
    idle_timeout: Duration,
}

impl LiveSessions {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    /// 세션 태스크를 띄우고 목록에 등록합니다. 세션은 `NotStarted` 상태로 시작합니다.
    pub async fn open<S>(
        &self,
        user_id: &str,
        definition: WorkoutDefinition,
        store: S,
        weight_unit: &str,
        rest_tick: Duration,
    ) -> LiveSessionHandle
    where
        S: ExerciseCatalog + PersonalRecordChecker + SessionSink + Send + Sync + 'static,
    {
        let id = uuid::Uuid::now_v7().to_string();
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let handle = LiveSessionHandle {
            id: id.clone(),
            user_id: user_id.to_string(),
            commands,
        };
        // 태스크가 바로 끝나도 등록 해제가 등록보다 먼저 일어나지 않도록 먼저 넣습니다.
        self.sessions.lock().await.insert(id.clone(), handle.clone());

        let actor = SessionActor {
            id: id.clone(),
            user_id: user_id.to_string(),
            weight_unit: weight_unit.to_string(),
            runner: WorkoutSessionRunner::new(definition),
            store: Arc::new(store),
            notifications: Vec::new(),
            registry: Arc::downgrade(&self.sessions),
        };
        tokio::spawn(actor.run(receiver, rest_tick, self.idle_timeout));

        tracing::debug!("Opened live session {} for user {}", id, user_id);
        handle
    }

    /// 다른 사용자의 세션은 없는 것으로 취급합니다.
    pub async fn get(&self, user_id: &str, id: &str) -> Option<LiveSessionHandle> {
        self.sessions
            .lock()
            .await
            .get(id)
            .filter(|handle| handle.user_id == user_id)
            .cloned()
    }

    pub async fn remove(&self, user_id: &str, id: &str) -> Option<LiveSessionHandle> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(id) {
            Some(handle) if handle.user_id == user_id => sessions.remove(id),
            _ => None,
        }
    }

    pub async fn count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

struct SessionActor<S> {
    id: String,
    user_id: String,
    weight_unit: String,
    runner: WorkoutSessionRunner,
    store: Arc<S>,
    notifications: Vec<RecordNotification>,
    registry: Weak<Registry>,
}

/// 명령 처리 후 태스크를 계속 돌릴지
enum Flow {
    Continue,
    Stop,
}

impl<S> SessionActor<S>
where
    S: ExerciseCatalog + PersonalRecordChecker + SessionSink + Send + Sync + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        rest_tick: Duration,
        idle_timeout: Duration,
    ) {
        let (record_tx, mut record_rx) = mpsc::unbounded_channel();
        let mut ticker = tokio::time::interval(rest_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let idle = tokio::time::sleep(idle_timeout);
        tokio::pin!(idle);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else {
                        tracing::info!("Live session {} dropped without finishing", self.id);
                        break;
                    };
                    idle.as_mut().reset(Instant::now() + idle_timeout);
                    if let Flow::Stop = self.handle(command, &record_tx, &mut ticker).await {
                        break;
                    }
                }
                () = &mut idle => {
                    tracing::info!(
                        "Live session {} expired after {:?} without commands ({:?})",
                        self.id,
                        idle_timeout,
                        self.runner.status()
                    );
                    break;
                }
                _ = ticker.tick(), if self.runner.rest().is_some() => {
                    self.runner.tick();
                }
                Some(notification) = record_rx.recv() => {
                    tracing::info!(
                        "Live session {}: new personal record on {} ({} {})",
                        self.id,
                        notification.exercise_name,
                        notification.value,
                        notification.unit
                    );
                    self.notifications.push(notification);
                }
            }
        }
        self.unregister().await;
    }

    /// 목록에서 자기 자신을 뺍니다. 목록이 먼저 사라졌으면 할 일이 없습니다.
    async fn unregister(&self) {
        if let Some(sessions) = self.registry.upgrade() {
            if sessions.lock().await.remove(&self.id).is_some() {
                tracing::debug!("Live session {} unregistered", self.id);
            }
        }
    }

    async fn handle(
        &mut self,
        command: Command,
        record_tx: &mpsc::UnboundedSender<RecordNotification>,
        ticker: &mut tokio::time::Interval,
    ) -> Flow {
        match command {
            Command::Start(reply) => {
                let result = self.runner.start(Utc::now()).map(|_| self.view());
                let _ = reply.send(result);
            }
            Command::Pause(reply) => {
                let result = self.runner.pause(Utc::now()).map(|_| self.view());
                let _ = reply.send(result);
            }
            Command::Resume(reply) => {
                let result = self.runner.resume(Utc::now()).map(|_| self.view());
                let _ = reply.send(result);
            }
            Command::CompleteSet(entry, reply) => {
                let result = self.runner.complete_current_set(entry).map(|completion| {
                    if completion.rest.is_some() {
                        // 새 카운트다운은 지금부터 한 틱 뒤에 처음 줄어듭니다.
                        ticker.reset();
                    }
                    if let Some(candidate) = &completion.record_candidate {
                        self.spawn_record_check(candidate.clone(), record_tx.clone());
                    }
                    SetOutcome {
                        completion,
                        session: self.view(),
                    }
                });
                let _ = reply.send(result);
            }
            Command::Finish(reply) => {
                let result = self.runner.finish(self.store.as_ref(), Utc::now()).await;
                let finished = result.is_ok();
                match &result {
                    Ok(_) => tracing::info!(
                        "Live session {} saved as {:?}",
                        self.id,
                        self.runner.session_id()
                    ),
                    Err(e) => {
                        tracing::warn!("Live session {} could not be finished: {}", self.id, e)
                    }
                }
                let _ = reply.send(result);
                if finished {
                    return Flow::Stop;
                }
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(Ok(self.view()));
            }
            Command::Abandon(reply) => {
                let completed_sets = self
                    .runner
                    .exercises()
                    .iter()
                    .flat_map(|exercise| &exercise.sets)
                    .filter(|set| set.completed)
                    .count();
                tracing::info!(
                    "Live session {} abandoned at {:?} ({:?}, {} sets completed)",
                    self.id,
                    self.runner.cursor(),
                    self.runner.status(),
                    completed_sets
                );
                let _ = reply.send(Ok(()));
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// 기록 판정은 세트 완료를 막지 않습니다. 실패는 로그만 남깁니다.
    fn spawn_record_check(
        &self,
        candidate: RecordCandidate,
        record_tx: mpsc::UnboundedSender<RecordNotification>,
    ) {
        let store = Arc::clone(&self.store);
        let session_id = self.id.clone();
        let user_id = self.user_id.clone();
        let unit = self.weight_unit.clone();

        tokio::spawn(async move {
            let is_record = match store
                .check(&user_id, &candidate.exercise_id, candidate.kind, candidate.value, &unit)
                .await
            {
                Ok(is_record) => is_record,
                Err(e) => {
                    tracing::warn!(
                        "Personal record check failed for {}: {}",
                        candidate.exercise_id,
                        e
                    );
                    return;
                }
            };
            if !is_record {
                return;
            }

            let exercise_name = match store.exercise_name(&candidate.exercise_id).await {
                Ok(Some(name)) => name,
                Ok(None) => candidate.exercise_id.clone(),
                Err(e) => {
                    tracing::warn!("Exercise lookup failed for {}: {}", candidate.exercise_id, e);
                    candidate.exercise_id.clone()
                }
            };
            let notification = RecordNotification {
                exercise_id: candidate.exercise_id,
                exercise_name,
                value: candidate.value,
                unit,
                achieved_at: Utc::now(),
            };
            if record_tx.send(notification).is_err() {
                tracing::info!(
                    "Personal record confirmed after live session {} ended",
                    session_id
                );
            }
        });
    }

    fn view(&self) -> LiveSessionView {
        LiveSessionView {
            id: self.id.clone(),
            session: self.runner.snapshot(),
            notifications: self.notifications.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;
    use crate::services::session_runner::SessionStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 호출 횟수를 세는 테스트용 협력자
    #[derive(Default)]
    struct FakeStore {
        checks: AtomicUsize,
        saves: AtomicUsize,
        check_delay: Duration,
        failing_checker: bool,
    }

    impl ExerciseCatalog for Arc<FakeStore> {
        async fn exercise_name(&self, exercise_id: &str) -> Result<Option<String>, AppError> {
            Ok((exercise_id == "bench").then(|| "Bench Press".to_string()))
        }
    }

    impl PersonalRecordChecker for Arc<FakeStore> {
        async fn check(
            &self,
            _user_id: &str,
            _exercise_id: &str,
            _kind: RecordType,
            _value: f64,
            _unit: &str,
        ) -> Result<bool, AppError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.check_delay).await;
            if self.failing_checker {
                return Err(AppError::Internal("checker offline".to_string()));
            }
            Ok(true)
        }
    }

    impl SessionSink for Arc<FakeStore> {
        async fn save(&self, _session: &FinalizedSession) -> Result<String, AppError> {
            let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("saved-{}", n))
        }
    }

    fn bench_day(sets: u32, rest: u32) -> WorkoutDefinition {
        WorkoutDefinition::new(
            "w1",
            "Bench Day",
            vec![ExercisePrescription {
                exercise_id: "bench".to_string(),
                sets,
                reps: Some(8),
                weight: Some(60.0),
                rest_time: rest,
                notes: None,
            }],
        )
        .unwrap()
    }

    fn registry() -> LiveSessions {
        LiveSessions::new(Duration::from_secs(60))
    }

    async fn wait_until_empty(sessions: &LiveSessions) {
        for _ in 0..100 {
            if sessions.count().await == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("live sessions were not cleaned up");
    }

    async fn open(
        sessions: &LiveSessions,
        store: &Arc<FakeStore>,
        definition: WorkoutDefinition,
    ) -> LiveSessionHandle {
        sessions
            .open("u1", definition, Arc::clone(store), "kg", Duration::from_millis(10))
            .await
    }

    async fn wait_for<F>(handle: &LiveSessionHandle, mut done: F) -> LiveSessionView
    where
        F: FnMut(&LiveSessionView) -> bool,
    {
        for _ in 0..100 {
            let view = handle.snapshot().await.unwrap();
            if done(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn record_notification_arrives_without_blocking_the_set() {
        let sessions = registry();
        let store = Arc::new(FakeStore {
            check_delay: Duration::from_millis(30),
            ..Default::default()
        });
        let handle = open(&sessions, &store, bench_day(2, 0)).await;

        handle.start().await.unwrap();
        let outcome = handle.complete_set(SetEntry::default()).await.unwrap();
        assert!(outcome.session.notifications.is_empty());
        assert_eq!(outcome.session.session.cursor.set_index, 1);

        let view = wait_for(&handle, |v| !v.notifications.is_empty()).await;
        assert_eq!(view.notifications[0].exercise_name, "Bench Press");
        assert_eq!(view.notifications[0].unit, "kg");
        assert_eq!(store.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rest_countdown_runs_down_on_the_ticker() {
        let sessions = registry();
        let store = Arc::new(FakeStore::default());
        let handle = open(&sessions, &store, bench_day(3, 3)).await;

        handle.start().await.unwrap();
        let outcome = handle.complete_set(SetEntry::default()).await.unwrap();
        assert_eq!(outcome.completion.rest.map(|r| r.remaining_seconds), Some(3));

        let view = wait_for(&handle, |v| v.session.rest.is_none()).await;
        assert_eq!(view.session.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn invalid_transitions_surface_as_conflicts() {
        let sessions = registry();
        let store = Arc::new(FakeStore::default());
        let handle = open(&sessions, &store, bench_day(2, 0)).await;

        assert!(matches!(
            handle.complete_set(SetEntry::default()).await,
            Err(AppError::InvalidState(_))
        ));
        handle.start().await.unwrap();
        handle.pause().await.unwrap();
        assert!(matches!(
            handle.complete_set(SetEntry::default()).await,
            Err(AppError::InvalidState(_))
        ));
        handle.resume().await.unwrap();
        assert!(handle.complete_set(SetEntry::default()).await.is_ok());
    }

    #[tokio::test]
    async fn finish_saves_once_and_ends_the_task() {
        let sessions = registry();
        let store = Arc::new(FakeStore {
            check_delay: Duration::from_millis(50),
            ..Default::default()
        });
        let handle = open(&sessions, &store, bench_day(1, 0)).await;

        handle.start().await.unwrap();
        handle.complete_set(SetEntry::default()).await.unwrap();
        let session_id = handle.finish().await.unwrap();
        assert_eq!(session_id, "saved-1");

        // 늦게 끝난 기록 판정은 끝난 세션에 아무 영향도 주지 않습니다.
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.checks.load(Ordering::SeqCst), 1);
        assert!(matches!(handle.snapshot().await, Err(AppError::NotFound)));
        assert!(matches!(handle.finish().await, Err(AppError::NotFound)));
        assert_eq!(store.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn checker_failure_is_suppressed() {
        let sessions = registry();
        let store = Arc::new(FakeStore {
            failing_checker: true,
            ..Default::default()
        });
        let handle = open(&sessions, &store, bench_day(2, 0)).await;

        handle.start().await.unwrap();
        handle.complete_set(SetEntry::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        let view = handle.snapshot().await.unwrap();
        assert!(view.notifications.is_empty());
        assert_eq!(view.session.cursor.set_index, 1);
    }

    #[tokio::test]
    async fn registry_is_scoped_by_owner_and_abandon_stops_the_task() {
        let sessions = registry();
        let store = Arc::new(FakeStore::default());
        let handle = open(&sessions, &store, bench_day(2, 0)).await;

        assert!(sessions.get("u2", handle.id()).await.is_none());
        assert!(sessions.remove("u2", handle.id()).await.is_none());
        assert!(sessions.get("u1", handle.id()).await.is_some());

        let removed = sessions.remove("u1", handle.id()).await.unwrap();
        removed.abandon().await.unwrap();
        assert_eq!(sessions.count().await, 0);
        assert!(matches!(handle.snapshot().await, Err(AppError::NotFound)));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn finished_session_leaves_the_registry_on_its_own() {
        let sessions = registry();
        let store = Arc::new(FakeStore::default());
        let handle = open(&sessions, &store, bench_day(1, 0)).await;
        assert_eq!(sessions.count().await, 1);

        handle.start().await.unwrap();
        handle.complete_set(SetEntry::default()).await.unwrap();
        handle.finish().await.unwrap();

        wait_until_empty(&sessions).await;
        assert!(sessions.get("u1", handle.id()).await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_expire_and_are_unregistered() {
        let sessions = LiveSessions::new(Duration::from_millis(50));
        let store = Arc::new(FakeStore::default());
        let never_started = open(&sessions, &store, bench_day(2, 0)).await;
        let left_running = open(&sessions, &store, bench_day(2, 30)).await;
        left_running.start().await.unwrap();
        left_running.complete_set(SetEntry::default()).await.unwrap();
        assert_eq!(sessions.count().await, 2);

        wait_until_empty(&sessions).await;
        assert!(matches!(never_started.snapshot().await, Err(AppError::NotFound)));
        assert!(matches!(left_running.snapshot().await, Err(AppError::NotFound)));
        assert_eq!(store.saves.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn commands_keep_a_session_alive() {
        let sessions = LiveSessions::new(Duration::from_millis(200));
        let store = Arc::new(FakeStore::default());
        let handle = open(&sessions, &store, bench_day(2, 0)).await;

        for _ in 0..6 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.snapshot().await.unwrap();
        }
        assert_eq!(sessions.count().await, 1);
    }
}
