//! End-to-end conversation tests over an in-memory store

use rand::rngs::StdRng;
use rand::SeedableRng;

use voiq_bot::messages;
use voiq_bot::{
    Action, Command, Controller, Delivery, Event, Incoming, MessageRef, QuizEngine, SessionState, SqliteStore,
    UserInfo, VocabularyStore, WordPair,
};

const CHAT: i64 = 2024;

fn learner() -> UserInfo {
    UserInfo {
        external_id: 31337,
        username: Some("learner".to_string()),
        display_name: "Learner".to_string(),
    }
}

fn controller_with(base: &[(&str, &str)], seed: u64) -> Controller<SqliteStore> {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    let pairs: Vec<WordPair> = base.iter().map(|(w, t)| WordPair::new(*w, *t)).collect();
    store.insert_base_words(&pairs).expect("seed base words");
    Controller::new(QuizEngine::with_rng(store, StdRng::seed_from_u64(seed)))
}

fn send(controller: &mut Controller<SqliteStore>, event: Event) -> voiq_bot::Outcome {
    controller.handle(&Incoming {
        chat_id: CHAT,
        user: learner(),
        event,
    })
}

fn press(controller: &mut Controller<SqliteStore>, action: Action) -> voiq_bot::Outcome {
    send(controller, Event::Callback(action.tag()))
}

#[test]
fn single_pair_vocabulary_yields_card_without_distractors() {
    let mut controller = controller_with(&[("dog", "собака")], 1);
    let card = press(&mut controller, Action::StartQuiz).reply.expect("card");

    let tags: Vec<String> = card.keyboard.expect("keyboard").buttons().map(|b| b.action.tag()).collect();
    assert_eq!(tags, vec!["answer_собака".to_string()]);

    let session = controller.engine().session(CHAT).expect("session");
    let round = session.active_round().expect("round");
    assert_eq!(round.question, "dog");
    assert_eq!(round.correct_answer, "собака");
    assert!(round.distractors.is_empty());
}

#[test]
fn exact_match_boundary_on_answers() {
    let mut controller = controller_with(&[("dog", "собака")], 2);
    press(&mut controller, Action::StartQuiz);

    let padded = press(&mut controller, Action::SubmitAnswer("собака ".to_string()));
    assert_eq!(padded.notice.as_deref(), Some(messages::INCORRECT_NOTICE));

    let exact = press(&mut controller, Action::SubmitAnswer("собака".to_string()));
    assert_eq!(exact.notice.as_deref(), Some(messages::CORRECT_NOTICE));

    let session = controller.engine().session(CHAT).expect("session");
    assert_eq!(session.state, SessionState::Idle);
    assert_eq!(session.previous_word.as_deref(), Some("dog"));
}

#[test]
fn incorrect_answers_keep_question_and_message() {
    let mut controller = controller_with(&[("dog", "собака"), ("cat", "кошка"), ("sun", "солнце")], 3);
    press(&mut controller, Action::StartQuiz);
    controller.card_delivered(CHAT, MessageRef(501));
    let before = controller.engine().session(CHAT).unwrap().active_round().unwrap().clone();

    for _ in 0..3 {
        let reply = press(&mut controller, Action::SubmitAnswer("nope".to_string())).reply.unwrap();
        assert_eq!(reply.delivery, Delivery::Edit(MessageRef(501)));
    }

    let after = controller.engine().session(CHAT).unwrap().active_round().unwrap();
    assert_eq!(after.question, before.question);
    assert_eq!(after.correct_answer, before.correct_answer);
    assert_eq!(after.distractors, before.distractors);
}

#[test]
fn next_word_differs_from_the_one_just_answered() {
    let mut controller = controller_with(&[("dog", "собака"), ("cat", "кошка")], 4);
    for _ in 0..10 {
        press(&mut controller, Action::StartQuiz);
        let round = controller.engine().session(CHAT).unwrap().active_round().unwrap().clone();
        press(&mut controller, Action::SubmitAnswer(round.correct_answer.clone()));

        press(&mut controller, Action::StartQuiz);
        let next = controller.engine().session(CHAT).unwrap().active_round().unwrap().clone();
        assert_ne!(next.question, round.question);
        press(&mut controller, Action::SubmitAnswer(next.correct_answer));
    }
}

#[test]
fn personal_vocabulary_management() {
    let mut controller = controller_with(&[], 5);

    press(&mut controller, Action::AddWord);
    send(&mut controller, Event::Text(" кот ".to_string()));
    let added = send(&mut controller, Event::Text(" cat ".to_string())).reply.unwrap();
    assert!(added.text.contains("'кот' с переводом 'cat'"));

    press(&mut controller, Action::AddWord);
    send(&mut controller, Event::Text("дом".to_string()));
    send(&mut controller, Event::Text("house".to_string()));

    let listing = press(&mut controller, Action::ShowMyWords).reply.unwrap();
    assert_eq!(listing.text, "📚 Ваши слова (2):\nдом - house\nкот - cat");

    press(&mut controller, Action::RequestDelete("кот".to_string()));
    let cancelled = press(&mut controller, Action::CancelDelete);
    assert_eq!(cancelled.notice.as_deref(), Some(messages::DELETE_CANCELLED));

    let deleted = press(&mut controller, Action::ConfirmDelete("кот".to_string())).reply.unwrap();
    assert_eq!(deleted.text, "✅ Слово 'кот' успешно удалено!");

    let listing = press(&mut controller, Action::ShowMyWords).reply.unwrap();
    assert_eq!(listing.text, "📚 Ваши слова (1):\nдом - house");
}

#[test]
fn personal_words_feed_rounds_when_base_is_empty() {
    let mut controller = controller_with(&[], 6);
    press(&mut controller, Action::AddWord);
    send(&mut controller, Event::Text("яблоко".to_string()));
    send(&mut controller, Event::Text("apple".to_string()));

    // Each attempt reaches the personal vocabulary only half of the time
    let card = (0..5)
        .filter_map(|_| press(&mut controller, Action::StartQuiz).reply)
        .find(|reply| reply.is_card)
        .expect("a card within a few tries");
    assert!(card.text.contains("яблоко"));
}

#[test]
fn command_abandons_add_word_flow() {
    let mut controller = controller_with(&[], 7);
    press(&mut controller, Action::AddWord);
    send(&mut controller, Event::Command(Command::Help));

    let reply = send(&mut controller, Event::Text("кот".to_string())).reply.unwrap();
    assert_eq!(reply.text, messages::MAIN_MENU);
    let store = controller.engine().store();
    let user_id = store.ensure_user(&learner()).unwrap();
    assert_eq!(store.count_user_words(user_id).unwrap(), 0);
}

#[test]
fn sessions_are_kept_per_chat() {
    let mut controller = controller_with(&[("dog", "собака")], 8);
    press(&mut controller, Action::StartQuiz);

    let other = controller.handle(&Incoming {
        chat_id: CHAT + 1,
        user: learner(),
        event: Event::Callback(Action::SubmitAnswer("собака".to_string()).tag()),
    });
    assert_eq!(other.notice.as_deref(), Some(messages::STALE_NOTICE));
    assert!(controller.engine().session(CHAT).unwrap().active_round().is_some());
}
