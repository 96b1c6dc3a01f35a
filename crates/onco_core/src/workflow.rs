//! Hand-off from file intake to the analysis session.

use crate::controller::AnalysisController;
use crate::intake::{CandidateFile, FileIntake, RejectReason, Validation};
use crate::session::RequestId;
use std::sync::Arc;

/// How a candidate reached the intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeSource {
    Picker,
    Drop,
}

/// What became of a submitted candidate.
#[derive(Debug)]
pub enum Dispatch {
    /// Accepted and sent for analysis. The caller renders the preview from
    /// `file`; a failed preview does not affect the analysis.
    Started {
        file: Arc<CandidateFile>,
        id: RequestId,
    },
    /// Failed validation. The session was not touched.
    Rejected(RejectReason),
    /// An analysis is already running; the candidate was ignored.
    Busy,
}

/// Validate `candidate` and, when accepted, start exactly one analysis for it.
///
/// While the session is uploading nothing is validated and the selection is
/// kept; a pending drag is cancelled.
pub fn submit_for_analysis(
    intake: &mut FileIntake,
    controller: &mut AnalysisController,
    candidate: CandidateFile,
    source: IntakeSource,
) -> Dispatch {
    if controller.session().is_uploading() {
        tracing::debug!("ignoring {} while an analysis is running", candidate.name());
        intake.drag_leave();
        return Dispatch::Busy;
    }
    let validation = match source {
        IntakeSource::Picker => intake.submit(candidate),
        IntakeSource::Drop => intake.drop_file(candidate),
    };
    match validation {
        Validation::Accepted(file) => {
            let id = controller.start_analysis(Arc::clone(&file));
            Dispatch::Started { file, id }
        }
        Validation::Rejected(reason) => Dispatch::Rejected(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, PredictClient};
    use crate::intake::MAX_FILE_SIZE;
    use crate::prediction::{ClassLabel, PredictResponse};
    use crate::preview::render_preview;
    use crate::session::SessionStatus;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    const BENIGN: &str = r#"{"success":true,"prediction":"benign","confidence":88.0,
        "all_probabilities":{"benign":88.0,"malignant":7.0,"normal":5.0}}"#;

    /// Answers every request with a benign result and counts the calls.
    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    impl PredictClient for CountingClient {
        fn predict(&self, _file: &CandidateFile) -> Result<PredictResponse, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::from_str(BENIGN)?)
        }
    }

    fn setup() -> (Arc<CountingClient>, FileIntake, AnalysisController) {
        let client = Arc::new(CountingClient::default());
        let controller = AnalysisController::new(client.clone());
        (client, FileIntake::new(), controller)
    }

    fn png(name: &str) -> CandidateFile {
        CandidateFile::new(name, "image/png", vec![1, 2, 3])
    }

    fn rejected_candidates() -> Vec<CandidateFile> {
        vec![
            CandidateFile::new("scan.gif", "image/gif", vec![0; 16]),
            CandidateFile::new("scan.png", "image/png", vec![0; MAX_FILE_SIZE as usize + 1]),
        ]
    }

    #[rstest]
    #[case(IntakeSource::Picker)]
    #[case(IntakeSource::Drop)]
    fn rejected_file_leaves_idle_session_alone(#[case] source: IntakeSource) {
        let (client, mut intake, mut controller) = setup();
        for candidate in rejected_candidates() {
            let dispatch = submit_for_analysis(&mut intake, &mut controller, candidate, source);
            assert!(matches!(dispatch, Dispatch::Rejected(_)));
            assert_eq!(controller.session().status(), SessionStatus::Idle);
            assert!(controller.session().last_request().is_none());
        }
        assert!(intake.current().is_none());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rejected_file_keeps_the_previous_result() {
        let (client, mut intake, mut controller) = setup();
        submit_for_analysis(&mut intake, &mut controller, png("a.png"), IntakeSource::Picker);
        assert!(controller.wait(WAIT));
        assert_eq!(controller.session().status(), SessionStatus::Succeeded);

        for candidate in rejected_candidates() {
            let dispatch =
                submit_for_analysis(&mut intake, &mut controller, candidate, IntakeSource::Drop);
            assert!(matches!(dispatch, Dispatch::Rejected(_)));
        }
        assert_eq!(controller.session().status(), SessionStatus::Succeeded);
        assert_eq!(
            controller.session().result().map(|r| r.prediction),
            Some(ClassLabel::Benign)
        );
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    #[case(IntakeSource::Picker)]
    #[case(IntakeSource::Drop)]
    fn accepted_file_starts_exactly_one_analysis(#[case] source: IntakeSource) {
        let (client, mut intake, mut controller) = setup();
        let Dispatch::Started { file, id } =
            submit_for_analysis(&mut intake, &mut controller, png("a.png"), source)
        else {
            panic!("expected the analysis to start");
        };
        assert_eq!(file.name(), "a.png");
        assert_eq!(controller.session().last_request(), Some(id));
        assert_eq!(intake.current().map(|f| f.name()), Some("a.png"));
        assert!(!intake.is_drag_active());

        assert!(controller.wait(WAIT));
        assert_eq!(controller.session().status(), SessionStatus::Succeeded);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn submissions_while_uploading_are_ignored() {
        let (client, mut intake, mut controller) = setup();
        let Dispatch::Started { id, .. } =
            submit_for_analysis(&mut intake, &mut controller, png("a.png"), IntakeSource::Picker)
        else {
            panic!("expected the analysis to start");
        };
        assert!(controller.session().is_uploading());

        intake.drag_enter();
        let dispatch =
            submit_for_analysis(&mut intake, &mut controller, png("b.png"), IntakeSource::Drop);
        assert!(matches!(dispatch, Dispatch::Busy));
        assert!(!intake.is_drag_active());
        assert_eq!(intake.current().map(|f| f.name()), Some("a.png"));
        assert_eq!(controller.session().last_request(), Some(id));

        assert!(controller.wait(WAIT));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn undecodable_preview_does_not_stop_the_analysis() {
        let (client, mut intake, mut controller) = setup();
        let candidate = CandidateFile::new("broken.png", "image/png", b"not an image".to_vec());
        let Dispatch::Started { file, .. } =
            submit_for_analysis(&mut intake, &mut controller, candidate, IntakeSource::Drop)
        else {
            panic!("expected the analysis to start");
        };
        assert!(render_preview(&file).is_err());

        assert!(controller.wait(WAIT));
        assert_eq!(controller.session().status(), SessionStatus::Succeeded);
        assert!(intake.preview().is_none());
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
