//! Behavior tests for accounts, sessions and the watchlist state machine.

use tickerdesk_web::{
    AccessDenied, AccountError, AccountStore, InMemoryAccountStore, SessionContext, Watchlist,
    WatchlistChange,
};

// =============================================================================
// Watchlist
// =============================================================================

#[test]
fn when_the_same_ticker_is_added_twice_the_watchlist_length_is_unchanged() {
    // Given: A watchlist holding one ticker
    let mut watchlist = Watchlist::new();
    watchlist.add("aapl");

    // When: The same ticker is added again with different casing and padding
    let change = watchlist.add("  AaPl ");

    // Then: Nothing is appended
    assert_eq!(change, WatchlistChange::AlreadyPresent(String::from("AAPL")));
    assert_eq!(watchlist.len(), 1);
}

#[test]
fn when_watchlist_is_cleared_no_selection_resolves_until_a_later_add() {
    // Given: A seeded watchlist with an explicit selection
    let mut watchlist = Watchlist::seeded(["AAPL", "TSLA", "INFY.NS"]);
    assert!(watchlist.select("INFY.NS"));

    // When: The watchlist is cleared and previous members are selected
    watchlist.clear();
    for ticker in ["AAPL", "TSLA", "INFY.NS"] {
        assert!(!watchlist.select(ticker));
    }

    // Then: The selection is unresolved
    assert_eq!(watchlist.selected(), None);

    // And: The next add becomes the selection
    watchlist.add("nvda");
    assert_eq!(watchlist.selected(), Some("NVDA"));
}

#[test]
fn when_a_non_member_is_selected_the_prior_selection_is_kept() {
    // Given: A watchlist with TSLA selected
    let mut watchlist = Watchlist::seeded(["AAPL", "TSLA"]);
    watchlist.select("TSLA");

    // When: A ticker outside the list is selected
    let accepted = watchlist.select("MSFT");

    // Then: The selection does not move
    assert!(!accepted);
    assert_eq!(watchlist.selected(), Some("TSLA"));
}

#[test]
fn when_blank_input_is_added_the_watchlist_is_untouched() {
    let mut watchlist = Watchlist::seeded(["AAPL"]);

    assert_eq!(watchlist.add("   \t"), WatchlistChange::Ignored);
    assert_eq!(watchlist.tickers(), ["AAPL"]);
}

// =============================================================================
// Accounts
// =============================================================================

#[test]
fn when_user_registers_then_login_succeeds_only_with_exact_credentials() {
    // Given: An empty account store and a fresh session
    let store = InMemoryAccountStore::new();
    let mut context = SessionContext::default();

    // When: alice registers
    context
        .register(&store, "alice", "secret")
        .expect("registration succeeds");

    // Then: Registration alone does not log in
    assert!(!context.session().is_logged_in());

    // And: Only the exact pair logs in
    for (user, pass) in [("alice", "Secret"), ("ALICE", "secret"), ("alice", "secret ")] {
        assert_eq!(
            context.login(&store, user, pass),
            Err(AccountError::Authentication)
        );
    }
    assert_eq!(context.login(&store, "alice", "secret"), Ok(()));
    assert_eq!(context.session().username(), Some("alice"));
}

#[test]
fn when_username_is_registered_twice_the_original_password_stays_authoritative() {
    // Given: alice registered with "secret"
    let store = InMemoryAccountStore::new();
    store.register("alice", "secret").expect("first registration");

    // When: alice registers again with another password
    let error = store
        .register("alice", "hunter2")
        .expect_err("duplicate must conflict");

    // Then: The conflict is reported and the first password still works
    assert_eq!(error.to_string(), "User 'alice' already exists");
    assert_eq!(store.verify("alice", "secret"), Ok(()));
    assert_eq!(store.verify("alice", "hunter2"), Err(AccountError::Authentication));
    assert_eq!(store.len(), 1);
}

#[test]
fn when_registration_fields_are_empty_a_validation_error_is_returned() {
    let store = InMemoryAccountStore::new();
    let mut context = SessionContext::default();

    let error = context
        .register(&store, "", "")
        .expect_err("empty fields are rejected");

    assert_eq!(error, AccountError::MissingCredentials);
    assert_eq!(error.to_string(), "Enter username and password");
    assert!(store.is_empty());
}

// =============================================================================
// Access gate
// =============================================================================

#[test]
fn when_fresh_session_logs_in_with_wrong_password_the_terminal_stays_locked() {
    // Given: The demo accounts and a fresh session
    let store = InMemoryAccountStore::with_demo_accounts();
    let mut context = SessionContext::new(Watchlist::seeded(["AAPL", "TSLA", "INFY.NS"]));

    // When: admin logs in with the wrong password
    let result = context.login(&store, "admin", "wrongpass");

    // Then: Authentication fails
    assert_eq!(result, Err(AccountError::Authentication));

    // And: The session is still logged out and the watchlist is gated
    assert!(!context.session().is_logged_in());
    assert_eq!(context.watchlist().err(), Some(AccessDenied));
    assert_eq!(context.watchlist_mut().err(), Some(AccessDenied));
}

#[test]
fn when_user_logs_out_twice_the_second_logout_is_a_no_op() {
    let store = InMemoryAccountStore::with_demo_accounts();
    let mut context = SessionContext::default();
    context.login(&store, "mrinmoy", "pass123").expect("demo login");

    context.logout();
    context.logout();

    assert!(!context.session().is_logged_in());
    assert!(context.watchlist().is_err());
}
