use crate::config::{DEFAULT_DISCLAIMER, DEFAULT_POPUP_COOKIE, DEFAULT_POPUP_MESSAGES, EnhancerConfig};
use crate::host::{DebugCommand, HostEvent, IntakePlacement, TimerSlot};
use crate::intake::{FormField, IntakePhase};
use crate::popup::PopupPhase;
use crate::testing::{Delivery, Dispatched, FakeHost, Harness};

const ADA_PAYLOAD: &str = "<first_name>Ada</first_name>|<last_name>Lovelace</last_name>|<title></title>|<email>ada@x.com</email>|<phone></phone>|<company></company>|<message>Tell me about analytical engines</message>";

/// Intake scenarios run without the popup chain.
fn quiet_config() -> EnhancerConfig {
    let mut config = EnhancerConfig::default();
    config.popup.enabled = false;
    config
}

fn opened(config: EnhancerConfig) -> Harness {
    let mut harness = Harness::new(config);
    harness.start();
    harness.open_chat();
    harness.advance_ms(1_000);
    harness
}

fn fill_ada(harness: &mut Harness) {
    harness.fill(FormField::FirstName, "Ada");
    harness.fill(FormField::LastName, "Lovelace");
    harness.fill(FormField::Email, "ada@x.com");
    harness.fill(FormField::Message, "Tell me about analytical engines");
    harness.advance_ms(150);
}

fn submit_ada(harness: &mut Harness) {
    fill_ada(harness);
    harness.submit();
    harness.advance_ms(1_000);
}

fn intake_displayed(harness: &Harness) -> bool {
    harness
        .host()
        .intake
        .as_ref()
        .is_some_and(|intake| harness.host().is_displayed(intake.node))
}

fn native_displayed(harness: &Harness) -> bool {
    harness
        .host()
        .native_form_node()
        .is_some_and(|form| harness.host().is_displayed(form))
}

#[test]
fn opening_the_chat_swaps_in_the_intake_form() {
    let harness = opened(quiet_config());
    let status = harness.enhancer.status();

    assert!(status.chat_open);
    assert!(status.chat_initialized);
    assert_eq!(status.intake, IntakePhase::Shown { complete: false });
    assert!(intake_displayed(&harness));
    assert!(!native_displayed(&harness));
    assert!(matches!(
        harness.host().intake.as_ref().map(|intake| &intake.placement),
        Some(IntakePlacement::AppendTo(_))
    ));
    assert_eq!(harness.host().close_buttons_created, 1);
}

#[test]
fn intake_goes_before_the_history_without_a_greeting() {
    let mut harness = Harness::new(quiet_config());
    harness.start();
    harness.open_chat();
    harness.host_mut().remove_greeting();
    harness.advance_ms(1_000);

    assert!(matches!(
        harness.host().intake.as_ref().map(|intake| &intake.placement),
        Some(IntakePlacement::Before(_))
    ));
}

#[test]
fn submission_delivers_the_exact_payload() {
    let mut harness = opened(quiet_config());
    submit_ada(&mut harness);

    let host = harness.host();
    assert_eq!(host.sent, vec![ADA_PAYLOAD.to_string()]);
    assert_eq!(host.dispatched, vec![Dispatched::FormSubmit]);
    assert_eq!(host.session_raw(), Some("true"));
    assert!(!intake_displayed(&harness));
    assert!(native_displayed(&harness));

    let echoes = harness.host().user_messages();
    assert_eq!(echoes.len(), 1);
    assert_eq!(echoes[0].text, "Tell me about analytical engines");
    assert!(echoes[0].processed);

    let status = harness.enhancer.status();
    assert!(status.form_submitted);
    assert_eq!(status.intake, IntakePhase::Submitted);
    assert!(!status.delivery_pending);
}

#[test]
fn hidden_send_button_does_not_stall_delivery() {
    let mut harness = opened(quiet_config());
    let send = harness.host().send_button();
    assert!(send.is_some());
    if let Some(send) = send {
        harness.host_mut().set_suppressed(send, true);
    }
    harness.flush_mutations();
    submit_ada(&mut harness);

    let host = harness.host();
    assert_eq!(host.sent, vec![ADA_PAYLOAD.to_string()]);
    assert_eq!(host.dispatched, vec![Dispatched::FormSubmit]);
    assert!(!harness.enhancer.status().delivery_pending);
}

#[test]
fn client_context_rides_along_when_enabled() {
    let mut config = quiet_config();
    config.form.append_client_context = true;
    let mut harness = opened(config);
    submit_ada(&mut harness);

    let sent = &harness.host().sent;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with(ADA_PAYLOAD));
    assert!(sent[0].contains("|<browser_user_agent>FakeBrowser/1.0</browser_user_agent>|"));
    assert!(sent[0].contains("|<browser_device_memory>8</browser_device_memory>|"));
}

#[test]
fn gate_follows_required_fields_and_formats() {
    let mut harness = opened(quiet_config());
    harness.fill(FormField::FirstName, "Ada");
    harness.fill(FormField::LastName, "Lovelace");
    harness.advance_ms(150);
    assert_eq!(harness.host().intake.as_ref().map(|i| i.gate_open), Some(false));

    harness.submit();
    harness.advance_ms(1_000);
    assert!(harness.host().sent.is_empty());
    assert_eq!(
        harness.enhancer.status().intake,
        IntakePhase::Shown { complete: false }
    );

    harness.fill(FormField::Email, "ada@");
    harness.advance_ms(150);
    assert_eq!(harness.host().intake.as_ref().map(|i| i.gate_open), Some(false));

    harness.fill(FormField::Email, "ada@x.com");
    harness.advance_ms(150);
    assert_eq!(harness.host().intake.as_ref().map(|i| i.gate_open), Some(true));

    harness.fill(FormField::Phone, "12");
    harness.advance_ms(150);
    assert_eq!(harness.host().intake.as_ref().map(|i| i.gate_open), Some(true));
}

#[test]
fn malformed_optional_field_does_not_block_submission() {
    let mut harness = opened(quiet_config());
    harness.fill(FormField::FirstName, "Ada");
    harness.fill(FormField::LastName, "Lovelace");
    harness.fill(FormField::Email, "ada@x.com");
    harness.fill(FormField::Phone, "12");
    harness.advance_ms(150);
    assert_eq!(harness.host().intake.as_ref().map(|i| i.gate_open), Some(true));

    harness.submit();
    harness.advance_ms(2_000);
    let sent = &harness.host().sent;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("<phone>12</phone>"));
}

#[test]
fn native_form_stays_hidden_while_the_intake_form_is_up() {
    let mut harness = opened(quiet_config());
    for _ in 0..5 {
        harness.host_mut().rerender_native_form();
        harness.flush_mutations();
        harness.advance_ms(100);
        assert!(!native_displayed(&harness));
        assert!(intake_displayed(&harness));
    }
    assert_eq!(harness.host().intake_injections, 1);
}

#[test]
fn reset_clears_the_submission_and_rebuilds_the_form() {
    let mut harness = opened(quiet_config());
    submit_ada(&mut harness);

    harness.click_reset();
    assert_eq!(harness.host().session_raw(), None);
    assert!(harness.host().intake.is_none());
    let status = harness.enhancer.status();
    assert!(!status.form_submitted);
    assert!(!status.chat_initialized);

    harness.advance_ms(1_000);
    assert_eq!(harness.host().intake_injections, 2);
    assert!(intake_displayed(&harness));
    assert!(!native_displayed(&harness));
    assert_eq!(
        harness.enhancer.status().intake,
        IntakePhase::Shown { complete: false }
    );
}

#[test]
fn reset_during_delivery_abandons_the_payload() {
    let mut harness = opened(quiet_config());
    fill_ada(&mut harness);
    harness.submit();
    harness.click_reset();
    harness.advance_ms(2_000);

    assert!(harness.host().sent.is_empty());
    assert!(harness.host().dispatched.is_empty());
    assert_eq!(harness.host().session_raw(), None);
}

#[test]
fn reset_buttons_are_bound_once() {
    let mut harness = opened(quiet_config());
    let reset = harness.host().native_reset();
    assert!(reset.is_some_and(|reset| harness.host().node(reset).bound));

    harness.click_reset();
    harness.click_reset();
    harness.advance_ms(1_000);
    assert_eq!(harness.host().intake_injections, 2);
}

#[test]
fn closing_before_submission_starts_over() {
    let mut harness = opened(quiet_config());
    harness.fill(FormField::FirstName, "Ada");
    harness.click_close_button();
    assert!(harness.host().intake.is_none());
    assert_eq!(harness.host().native_close_clicks, 1);

    harness.advance_ms(200);
    let status = harness.enhancer.status();
    assert!(!status.chat_open);
    assert!(!status.chat_initialized);

    harness.open_chat();
    harness.advance_ms(1_000);
    assert_eq!(harness.host().intake_injections, 2);
    assert_eq!(
        harness
            .host()
            .intake
            .as_ref()
            .map(|intake| intake.values.get(FormField::FirstName).to_string()),
        Some(String::new())
    );
    assert_eq!(harness.host().close_buttons_created, 1);
}

#[test]
fn reopening_after_submission_keeps_the_native_form() {
    let mut harness = opened(quiet_config());
    submit_ada(&mut harness);

    harness.widget_closes_chat();
    harness.advance_ms(200);
    harness.open_chat();
    harness.advance_ms(1_000);

    assert_eq!(harness.host().intake_injections, 1);
    assert!(!intake_displayed(&harness));
    assert!(native_displayed(&harness));
    assert!(harness.host().custom_close_button().is_some());
}

#[test]
fn stored_submission_skips_the_form() {
    let config = quiet_config();
    let mut host = FakeHost::new(&config.widget);
    host.preload_session("true");
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.open_chat();
    harness.advance_ms(1_000);

    assert!(harness.host().intake.is_none());
    assert!(native_displayed(&harness));
    assert!(harness.enhancer.status().form_submitted);
}

#[test]
fn unexpected_stored_value_is_not_a_submission() {
    let config = quiet_config();
    let mut host = FakeHost::new(&config.widget);
    host.preload_session("yes");
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.open_chat();
    harness.advance_ms(1_000);

    assert!(intake_displayed(&harness));
}

#[test]
fn inactive_form_is_never_shown() {
    let mut config = quiet_config();
    config.form.active = false;
    let mut harness = opened(config);
    assert!(harness.host().intake.is_none());

    harness.send(HostEvent::Debug(DebugCommand::ShowForm));
    harness.send(HostEvent::Debug(DebugCommand::ResetForm));
    harness.advance_ms(1_000);
    assert!(harness.host().intake.is_none());
    assert!(!harness.enhancer.is_form_active());
}

#[test]
fn superseded_timer_firing_is_ignored() {
    let mut harness = Harness::new(quiet_config());
    harness.start();
    harness.host_mut().open_chat();
    harness.send(HostEvent::DomMutated);
    let stale = harness.host().timer_generation(TimerSlot::MutationDebounce);
    harness.send(HostEvent::DomMutated);
    let current = harness.host().timer_generation(TimerSlot::MutationDebounce);
    assert_ne!(stale, current);

    if let Some(stale) = stale {
        harness.fire_stale(TimerSlot::MutationDebounce, stale);
    }
    assert!(!harness.enhancer.status().chat_open);
    assert!(harness.host().has_timer(TimerSlot::MutationDebounce));

    harness.advance_ms(50);
    assert!(harness.enhancer.status().chat_open);
}

#[test]
fn disclaimer_is_added_once_to_assistant_times() {
    let mut harness = opened(quiet_config());
    let assistant = harness.host_mut().add_timestamp("9:05 AM", true);
    let user = harness.host_mut().add_timestamp("9:06 AM", false);
    let other = harness.host_mut().add_timestamp("Yesterday", true);
    harness.flush_mutations();
    harness.advance_ms(5_000);

    let host = harness.host();
    assert_eq!(host.node(assistant).text, format!("9:05 AM{DEFAULT_DISCLAIMER}"));
    assert_eq!(host.node(user).text, "9:06 AM");
    assert_eq!(host.node(other).text, "Yesterday");
}

#[test]
fn periodic_sweep_catches_unobserved_timestamps() {
    let mut harness = opened(quiet_config());
    let stamp = harness.host_mut().add_timestamp("10:15 PM", true);
    harness.host_mut().take_dirty();
    harness.advance_ms(1_000);

    assert_eq!(
        harness.host().node(stamp).text,
        format!("10:15 PM{DEFAULT_DISCLAIMER}")
    );
}

#[test]
fn transcript_cleanup_leaves_plain_messages_alone() {
    let mut harness = opened(quiet_config());
    let echo = harness.host_mut().add_user_message(ADA_PAYLOAD);
    let plain = harness.host_mut().add_user_message("What does <message> mean?");
    harness.flush_mutations();
    harness.advance_ms(500);

    let host = harness.host();
    assert_eq!(host.node(echo).text, "Tell me about analytical engines");
    assert!(host.node(echo).processed);
    assert_eq!(host.node(plain).text, "What does <message> mean?");
    assert!(!host.node(plain).processed);
}

#[test]
fn click_and_enter_only_fire_while_the_payload_is_pending() {
    let config = quiet_config();
    let mut host = FakeHost::new(&config.widget);
    host.delivery = Delivery::OnEnter;
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.open_chat();
    harness.advance_ms(1_000);
    submit_ada(&mut harness);

    assert_eq!(
        harness.host().dispatched,
        vec![Dispatched::FormSubmit, Dispatched::Click, Dispatched::Enter]
    );
    assert_eq!(harness.host().sent, vec![ADA_PAYLOAD.to_string()]);
}

#[test]
fn click_delivery_stops_the_enter_attempt() {
    let config = quiet_config();
    let mut host = FakeHost::new(&config.widget);
    host.delivery = Delivery::OnClick;
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.open_chat();
    harness.advance_ms(1_000);
    submit_ada(&mut harness);

    assert_eq!(
        harness.host().dispatched,
        vec![Dispatched::FormSubmit, Dispatched::Click]
    );
    assert_eq!(harness.host().sent.len(), 1);
}

#[test]
fn undelivered_payload_is_still_marked_submitted() {
    let config = quiet_config();
    let mut host = FakeHost::new(&config.widget);
    host.delivery = Delivery::Never;
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.open_chat();
    harness.advance_ms(1_000);
    submit_ada(&mut harness);

    let host = harness.host();
    assert!(host.sent.is_empty());
    assert_eq!(host.dispatched.len(), 3);
    assert_eq!(host.session_raw(), Some("true"));
    assert!(!harness.enhancer.status().delivery_pending);
}

#[test]
fn delivery_waits_for_a_visible_input() {
    let mut harness = opened(quiet_config());
    fill_ada(&mut harness);
    harness.submit();
    let textbox = harness.host().textbox();
    if let Some(textbox) = textbox {
        harness.host_mut().set_suppressed(textbox, true);
    }
    harness.flush_mutations();
    harness.advance_ms(500);
    assert!(harness.host().sent.is_empty());

    if let Some(textbox) = textbox {
        harness.host_mut().set_suppressed(textbox, false);
    }
    harness.flush_mutations();
    harness.advance_ms(1_000);
    assert_eq!(harness.host().sent, vec![ADA_PAYLOAD.to_string()]);
}

#[test]
fn delivery_gives_up_when_the_input_never_shows() {
    let mut harness = opened(quiet_config());
    fill_ada(&mut harness);
    harness.submit();
    if let Some(textbox) = harness.host().textbox() {
        harness.host_mut().set_suppressed(textbox, true);
    }
    harness.flush_mutations();
    harness.advance_ms(6_000);

    let host = harness.host();
    assert!(host.sent.is_empty());
    assert!(host.dispatched.is_empty());
    assert_eq!(host.session_raw(), None);
    assert!(!harness.enhancer.status().delivery_pending);
    assert!(!harness.host().has_timer(TimerSlot::DeliveryInject));
}

#[test]
fn greeting_override_is_applied_once() {
    let mut config = quiet_config();
    config.greeting.title = Some("Hi there".to_string());
    config.greeting.body = Some("Ask us anything.".to_string());
    let harness = opened(config);

    let greeting = harness.host().greeting();
    let node = greeting.map(|greeting| harness.host().node(greeting));
    assert_eq!(node.map(|node| node.text.as_str()), Some("Hi there\nAsk us anything."));
    assert!(node.is_some_and(|node| node.processed));
}

#[test]
fn debug_reset_reopens_the_form() {
    let mut harness = opened(quiet_config());
    submit_ada(&mut harness);

    harness.send(HostEvent::Debug(DebugCommand::ResetForm));
    assert_eq!(harness.host().session_raw(), None);
    harness.advance_ms(200);
    assert_eq!(harness.host().intake_injections, 2);
    assert!(intake_displayed(&harness));
}

#[test]
fn status_serializes_for_the_debug_surface() {
    let harness = opened(quiet_config());
    let json = harness.enhancer.status().to_json();
    assert!(json.contains("\"chat_open\": true"));
    assert!(json.contains("\"chat_container\": true"));
    assert!(json.contains("\"phase\": \"shown\""));
}

#[test]
fn launcher_click_stops_the_popup_chain() {
    let mut harness = Harness::new(EnhancerConfig::default());
    harness.start();
    assert!(harness.host().launcher_bound);

    harness.advance_ms(2_000);
    assert_eq!(harness.host().bubbles_mounted, 1);
    assert!(harness.host().outside_click_armed);
    let bubble = harness.host().bubble.clone().unwrap_or_default();
    assert_eq!(
        harness.host().node(bubble.node).parent,
        Some(harness.host().launcher_container())
    );

    harness.advance_ms(50);
    assert!(harness.host().bubble.as_ref().is_some_and(|b| b.revealed));
    harness.advance_ms(250);
    assert_eq!(
        harness.host().bubble.as_ref().map(|b| b.typed.as_str()),
        Some(DEFAULT_POPUP_MESSAGES[0])
    );

    harness.click_launcher();
    assert!(harness.host().bubble.as_ref().is_some_and(|b| b.fading));
    assert!(!harness.host().outside_click_armed);
    harness.advance_ms(300);
    assert!(harness.host().bubble.is_none());

    harness.advance_ms(60_000);
    assert_eq!(harness.host().bubbles_mounted, 1);
    let popups = harness.enhancer.status().popups;
    assert!(!popups.continuous);
    assert_eq!(popups.shown, 1);
}

#[test]
fn popups_repeat_until_the_session_cap() {
    let mut config = EnhancerConfig::default();
    config.popup.max_per_session = 3;
    let mut harness = Harness::new(config);
    harness.start();
    harness.advance_ms(200_000);

    assert_eq!(harness.host().bubbles_mounted, 3);
    let popups = harness.enhancer.status().popups;
    assert_eq!(popups.shown, 3);
    assert_eq!(popups.phase, PopupPhase::Idle);
    assert!(!harness.host().has_timer(TimerSlot::PopupNext));
}

#[test]
fn outside_click_hides_and_the_chain_continues() {
    let mut harness = Harness::new(EnhancerConfig::default());
    harness.start();
    harness.advance_ms(2_000);

    harness.click_outside();
    assert!(harness.host().bubble.as_ref().is_some_and(|b| b.fading));
    harness.advance_ms(300);
    assert!(harness.host().bubble.is_none());
    assert!(!harness.host().has_timer(TimerSlot::PopupAutoHide));

    harness.advance_ms(20_000);
    assert_eq!(harness.host().bubbles_mounted, 2);
}

#[test]
fn cookie_marker_caps_popups_when_enabled() {
    let mut config = EnhancerConfig::default();
    config.popup.use_cookie_limit = true;
    let mut host = FakeHost::new(&config.widget);
    host.cookies.insert(DEFAULT_POPUP_COOKIE.to_string(), 1);
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.advance_ms(5_000);

    assert_eq!(harness.host().bubbles_mounted, 0);
    assert_eq!(harness.enhancer.status().popups.phase, PopupPhase::Idle);
}

#[test]
fn shown_popup_writes_the_cookie_marker() {
    let mut config = EnhancerConfig::default();
    config.popup.use_cookie_limit = true;
    let mut harness = Harness::new(config);
    harness.start();
    harness.advance_ms(2_000);
    assert_eq!(harness.host().cookies.get(DEFAULT_POPUP_COOKIE), Some(&1));

    harness.advance_ms(60_000);
    assert_eq!(harness.host().bubbles_mounted, 1);
}

#[test]
fn launcher_click_before_the_first_popup_cancels_it() {
    let mut harness = Harness::new(EnhancerConfig::default());
    harness.start();
    harness.advance_ms(1_000);
    harness.click_launcher();
    harness.advance_ms(10_000);

    assert_eq!(harness.host().bubbles_mounted, 0);
    assert!(!harness.host().has_timer(TimerSlot::PopupFirst));
}

#[test]
fn failed_mount_is_contained() {
    let config = EnhancerConfig::default();
    let mut host = FakeHost::new(&config.widget);
    host.fail_mount = true;
    let mut harness = Harness::with_host(host, config);
    harness.start();
    harness.advance_ms(3_000);

    let popups = harness.enhancer.status().popups;
    assert_eq!(popups.shown, 0);
    assert_eq!(popups.phase, PopupPhase::Idle);
    assert!(!harness.host().outside_click_armed);
}

#[test]
fn stop_all_halts_timers_and_observation() {
    let mut harness = Harness::new(EnhancerConfig::default());
    harness.start();
    harness.open_chat();
    harness.advance_ms(2_500);
    assert!(harness.host().bubble.is_some());

    harness.send(HostEvent::Debug(DebugCommand::StopAll));
    let status = harness.enhancer.status();
    assert!(status.stopped);
    assert!(status.pending_timers.is_empty());
    assert!(harness.host().bubble.is_none());
    assert!(!harness.host().outside_click_armed);

    harness.widget_closes_chat();
    harness.advance_ms(1_000);
    assert!(harness.enhancer.status().chat_open);
}
