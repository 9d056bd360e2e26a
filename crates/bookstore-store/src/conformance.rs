//! Behaviour every `Store` backend must share.

use bookstore_core::{
    Book, Genre, NewBook, Payment, PaymentId, PaymentMethod, Purchase, User, UserId,
};
use chrono::NaiveDate;

use crate::{ChangeSet, RecordKey, Store, StoreError};

fn sample_book(stock: u32) -> Book {
    let mut book = Book::new(NewBook {
        title: "Memórias Póstumas de Brás Cubas".into(),
        author: "Machado de Assis".into(),
        genre: Genre::Fiction,
        release_date: NaiveDate::from_ymd_opt(1881, 1, 1).unwrap(),
        price_cents: 1000,
        description: None,
        stock_quantity: stock,
    })
    .unwrap();
    book.version = 1;
    book
}

fn sample_user() -> User {
    let mut user = User::new(UserId::generate(), "Ana", "ana@example.com").unwrap();
    user.version = 1;
    user
}

fn sample_purchase(user: &User, book: &Book, quantity: u32) -> Purchase {
    let mut purchase = Purchase::new(user.id, book, quantity).unwrap();
    purchase.version = 1;
    purchase
}

fn commit_all(store: &dyn Store, records: Vec<crate::Record>) {
    let mut changes = ChangeSet::new();
    for record in records {
        changes.put(record);
    }
    store.commit(changes).unwrap();
}

pub fn versioned_writes(store: &dyn Store) {
    let mut book = sample_book(5);
    commit_all(store, vec![book.clone().into()]);

    // Stale write: still carries version 1.
    let mut stale = ChangeSet::new();
    stale.put(book.clone());
    assert!(matches!(
        store.commit(stale),
        Err(StoreError::Conflict { .. })
    ));

    book.stock_quantity = 4;
    book.version = 2;
    let mut next = ChangeSet::new();
    next.put(book.clone());
    store.commit(next).unwrap();

    let stored = store.get_book(&book.id).unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.stock_quantity, 4);
    assert_eq!(store.list_books().unwrap().len(), 1);
}

pub fn failed_commit_writes_nothing(store: &dyn Store) {
    let book = sample_book(5);
    let user = sample_user();
    commit_all(store, vec![book.clone().into()]);

    let mut changes = ChangeSet::new();
    changes.put(user.clone());
    // Book is at version 1; this delete expects 7.
    changes.delete(RecordKey::Book(book.id), 7);
    assert!(store.commit(changes).is_err());

    assert!(store.get_user(&user.id).unwrap().is_none());
    assert!(store.get_book(&book.id).unwrap().is_some());
}

pub fn purchase_indexes(store: &dyn Store) {
    let book = sample_book(5);
    let other_book = sample_book(1);
    let ana = sample_user();
    let bia = sample_user();
    let first = sample_purchase(&ana, &book, 1);
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = sample_purchase(&ana, &other_book, 1);
    let third = sample_purchase(&bia, &book, 2);
    commit_all(
        store,
        vec![
            book.clone().into(),
            other_book.into(),
            ana.clone().into(),
            bia.clone().into(),
            first.clone().into(),
            second.clone().into(),
            third.clone().into(),
        ],
    );

    let mine = store.list_purchases_by_user(&ana.id).unwrap();
    assert_eq!(
        mine.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert_eq!(store.list_purchases_by_book(&book.id).unwrap().len(), 2);

    let mut changes = ChangeSet::new();
    changes.delete(RecordKey::Purchase(first.id), 1);
    store.commit(changes).unwrap();

    assert_eq!(store.list_purchases_by_user(&ana.id).unwrap().len(), 1);
    assert_eq!(
        store.list_purchases_by_book(&book.id).unwrap()[0].id,
        third.id
    );
    assert!(store.get_purchase(&first.id).unwrap().is_none());
}

pub fn one_payment_per_purchase(store: &dyn Store) {
    let book = sample_book(5);
    let user = sample_user();
    let purchase = sample_purchase(&user, &book, 1);
    commit_all(
        store,
        vec![book.into(), user.into(), purchase.clone().into()],
    );

    let mut first = Payment::new(&purchase, PaymentMethod::CreditCard);
    first.version = 1;
    let mut second = Payment::new(&purchase, PaymentMethod::Boleto);
    second.version = 1;

    let mut changes = ChangeSet::new();
    changes.put(first.clone());
    store.commit(changes).unwrap();

    let mut changes = ChangeSet::new();
    changes.put(second.clone());
    assert!(store.commit(changes).unwrap_err().is_conflict());

    let stored = store.get_payment_by_purchase(&purchase.id).unwrap().unwrap();
    assert_eq!(stored.id, first.id);
    assert!(store.get_payment(&second.id).unwrap().is_none());
}

pub fn replacing_a_payment(store: &dyn Store) {
    let book = sample_book(5);
    let user = sample_user();
    let purchase = sample_purchase(&user, &book, 1);
    let mut old = Payment::new(&purchase, PaymentMethod::CreditCard);
    old.version = 1;
    commit_all(
        store,
        vec![
            book.into(),
            user.into(),
            purchase.clone().into(),
            old.clone().into(),
        ],
    );

    let mut replacement = Payment::new(&purchase, PaymentMethod::Boleto);
    replacement.version = 1;
    let mut changes = ChangeSet::new();
    changes.put(replacement.clone());
    changes.delete(RecordKey::Payment(old.id), 1);
    store.commit(changes).unwrap();

    let stored = store.get_payment_by_purchase(&purchase.id).unwrap().unwrap();
    assert_eq!(stored.id, replacement.id);

    let mut changes = ChangeSet::new();
    changes.delete(RecordKey::Payment(replacement.id), 1);
    store.commit(changes).unwrap();
    assert!(store.get_payment_by_purchase(&purchase.id).unwrap().is_none());
}

pub fn guards_detect_changes(store: &dyn Store) {
    let mut book = sample_book(5);
    commit_all(store, vec![book.clone().into()]);

    let missing = PaymentId::generate();
    let mut read_only = ChangeSet::new();
    read_only.guard(RecordKey::Book(book.id), 1);
    read_only.guard(RecordKey::Payment(missing), 0);
    store.commit(read_only.clone()).unwrap();

    book.version = 2;
    let mut bump = ChangeSet::new();
    bump.put(book);
    store.commit(bump).unwrap();

    assert!(store.commit(read_only).unwrap_err().is_conflict());
}
