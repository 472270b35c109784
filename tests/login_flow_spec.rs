use agenta_console::db::LocalStorage;
use agenta_console::login::*;
use agenta_console::routes::Route;
use agenta_console::session::*;

fn store() -> (LocalStorage, SessionStore) {
    let storage = LocalStorage::open_memory().expect("Failed to create storage");
    storage.migrate().expect("Failed to migrate");
    let pin = Credential::parse("5434").expect("Valid PIN");
    let store = SessionStore::init(storage.clone(), pin, RestorePolicy::TrustPersistedFlag)
        .expect("Failed to init store");
    (storage, store)
}

async fn type_keys(flow: &mut LoginFlow, store: &mut SessionStore, keys: &str) -> LoginOutcome {
    let mut last = LoginOutcome::Editing;
    for c in keys.chars() {
        last = flow
            .handle(PinInput::key(c), store)
            .await
            .expect("Storage failed");
    }
    last
}

mod typing {
    use super::*;

    #[tokio::test]
    async fn correct_pin_logs_in_on_the_fourth_digit() {
        let (storage, mut store) = store();
        let mut flow = LoginFlow::new();

        assert_eq!(type_keys(&mut flow, &mut store, "543").await, LoginOutcome::Editing);
        assert!(!store.is_authenticated());

        let outcome = type_keys(&mut flow, &mut store, "4").await;
        assert_eq!(
            outcome,
            LoginOutcome::Authenticated {
                landing: Route::Records
            }
        );
        assert!(store.is_authenticated());
        assert_eq!(storage.get_item(AUTH_KEY).unwrap(), Some("true".to_string()));
    }

    #[tokio::test]
    async fn wrong_pin_is_rejected_and_cells_are_kept() {
        let (storage, mut store) = store();
        let mut flow = LoginFlow::new();

        let outcome = type_keys(&mut flow, &mut store, "1234").await;
        assert_eq!(
            outcome,
            LoginOutcome::Rejected {
                message: WRONG_PIN_MESSAGE.to_string()
            }
        );
        assert_eq!(flow.error(), Some(WRONG_PIN_MESSAGE));
        assert_eq!(flow.pad().code(), "1234");
        assert!(!store.is_authenticated());
        assert_eq!(storage.get_item(AUTH_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn correcting_one_digit_resubmits() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        type_keys(&mut flow, &mut store, "5435").await;
        assert!(!store.is_authenticated());

        // Focus stays on the last cell, so typing overwrites it.
        let outcome = type_keys(&mut flow, &mut store, "4").await;
        assert!(matches!(outcome, LoginOutcome::Authenticated { .. }));
        assert!(flow.error().is_none());
    }

    #[tokio::test]
    async fn non_digits_are_ignored() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        type_keys(&mut flow, &mut store, "5a4 3").await;
        assert_eq!(flow.pad().code(), "543");
        assert_eq!(flow.pad().focus(), 3);
    }

    #[tokio::test]
    async fn retyping_the_same_digit_does_not_resubmit() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        type_keys(&mut flow, &mut store, "1234").await;
        let generation = store.generation();

        let outcome = type_keys(&mut flow, &mut store, "4").await;
        assert_eq!(outcome, LoginOutcome::Editing);
        assert_eq!(store.generation(), generation);
    }
}

mod pasting {
    use super::*;

    #[tokio::test]
    async fn pasting_the_pin_logs_in() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        let outcome = flow
            .handle(PinInput::Paste("5434".to_string()), &mut store)
            .await
            .unwrap();
        assert!(matches!(outcome, LoginOutcome::Authenticated { .. }));
        assert_eq!(flow.pad().focus(), 3);
    }

    #[tokio::test]
    async fn paste_fills_from_the_focused_cell() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        type_keys(&mut flow, &mut store, "5").await;
        let outcome = flow
            .handle(PinInput::Paste("4-3-4-9".to_string()), &mut store)
            .await
            .unwrap();

        assert!(matches!(outcome, LoginOutcome::Authenticated { .. }));
        assert_eq!(flow.pad().code(), "5434");
    }

    #[tokio::test]
    async fn paste_focuses_the_last_cell_with_content() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        flow.handle(PinInput::Paste("5434".to_string()), &mut store)
            .await
            .unwrap();
        store.logout().unwrap();
        flow.handle(PinInput::FocusPrev, &mut store).await.unwrap();
        flow.handle(PinInput::FocusPrev, &mut store).await.unwrap();
        assert_eq!(flow.pad().focus(), 1);

        flow.handle(PinInput::Paste("99".to_string()), &mut store)
            .await
            .unwrap();
        assert_eq!(flow.pad().code(), "5994");
        assert_eq!(flow.pad().focus(), 3);
    }

    #[tokio::test]
    async fn partial_paste_keeps_focus_on_later_digits() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        type_keys(&mut flow, &mut store, "1").await;
        flow.handle(PinInput::FocusNext, &mut store).await.unwrap();
        flow.handle(PinInput::FocusNext, &mut store).await.unwrap();
        type_keys(&mut flow, &mut store, "7").await;
        assert_eq!(flow.pad().cells(), &[Some('1'), None, None, Some('7')]);

        flow.handle(PinInput::FocusPrev, &mut store).await.unwrap();
        flow.handle(PinInput::FocusPrev, &mut store).await.unwrap();
        flow.handle(PinInput::Paste("2".to_string()), &mut store)
            .await
            .unwrap();
        assert_eq!(flow.pad().cells(), &[Some('1'), Some('2'), None, Some('7')]);
        assert_eq!(flow.pad().focus(), 3);
    }

    #[tokio::test]
    async fn paste_without_digits_changes_nothing() {
        let (_storage, mut store) = store();
        let mut flow = LoginFlow::new();

        flow.handle(PinInput::Paste("abc".to_string()), &mut store)
            .await
            .unwrap();
        assert_eq!(flow.pad(), &PinPad::new());
    }
}

mod pad_invariants {
    use super::*;

    fn inputs() -> Vec<PinInput> {
        vec![
            PinInput::key('7'),
            PinInput::key('x'),
            PinInput::Text(String::new()),
            PinInput::Backspace,
            PinInput::Paste("12".to_string()),
            PinInput::FocusPrev,
            PinInput::FocusNext,
        ]
    }

    fn check(pad: &PinPad) {
        assert!(pad.focus() < PIN_LENGTH, "focus {} out of range", pad.focus());
        for cell in pad.cells().iter().flatten() {
            assert!(cell.is_ascii_digit(), "cell holds {cell:?}");
        }
    }

    #[test]
    fn focus_and_cells_stay_valid_for_every_short_sequence() {
        let inputs = inputs();
        let mut frontier = vec![PinPad::new()];
        for _ in 0..5 {
            let mut next = Vec::with_capacity(frontier.len() * inputs.len());
            for pad in &frontier {
                for input in &inputs {
                    let mut pad = pad.clone();
                    pad.apply(input);
                    check(&pad);
                    next.push(pad);
                }
            }
            next.sort_by_key(|p| (p.cells().to_vec(), p.focus()));
            next.dedup();
            frontier = next;
        }
    }

    #[test]
    fn backspace_on_empty_cell_moves_left() {
        let mut pad = PinPad::new();
        pad.apply(&PinInput::key('1'));
        pad.apply(&PinInput::key('2'));
        assert_eq!(pad.focus(), 2);

        pad.apply(&PinInput::Backspace);
        assert_eq!(pad.focus(), 1);
        pad.apply(&PinInput::Backspace);
        assert_eq!(pad.code(), "1");
        assert_eq!(pad.focus(), 1);
    }
}
