use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use moneydesk_core::AggregateId;
use moneydesk_infra::command_dispatcher::CommandDispatcher;
use moneydesk_infra::event_store::KeyValueEventStore;
use moneydesk_infra::services::INVOICE_AGGREGATE;
use moneydesk_infra::store::InMemoryKeyValueStore;
use moneydesk_invoicing::{
    ClientDetails, CreateInvoice, Invoice, InvoiceCommand, InvoiceDetails, InvoiceId,
    InvoiceNumber, PaymentMethod, ReviseInvoice,
};
use moneydesk_money::{
    InvoiceLineItem, LoanTerms, MonetaryAmount, amortized_payment, amount_to_words,
    compute_invoice_totals,
};

type Dispatcher = CommandDispatcher<KeyValueEventStore<InMemoryKeyValueStore>>;

fn dispatcher() -> Dispatcher {
    CommandDispatcher::new(KeyValueEventStore::new(InMemoryKeyValueStore::new(), "bench"))
}

fn items(count: usize) -> Vec<InvoiceLineItem> {
    (0..count)
        .map(|i| {
            InvoiceLineItem::new(
                format!("Item {i}"),
                Decimal::from(i as u64 % 7 + 1),
                MonetaryAmount::new(dec!(19.99)).unwrap(),
            )
            .unwrap()
        })
        .collect()
}

fn details(item_count: usize) -> InvoiceDetails {
    InvoiceDetails {
        client: ClientDetails {
            name: "Bench Client".to_string(),
            email: "bench@example.test".to_string(),
            address: "1 Loop Rd".to_string(),
        },
        invoice_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        items: items(item_count),
        tax_rate: dec!(8.875),
        notes: None,
        payment_method: PaymentMethod::BankTransfer,
        payment_details: "ACH".to_string(),
    }
}

fn empty_invoice(id: AggregateId) -> Invoice {
    Invoice::empty(InvoiceId::new(id))
}

fn create(dispatcher: &Dispatcher) -> InvoiceId {
    let invoice_id = InvoiceId::new(AggregateId::new());
    dispatcher
        .dispatch(
            invoice_id.0,
            INVOICE_AGGREGATE,
            InvoiceCommand::CreateInvoice(CreateInvoice {
                invoice_id,
                invoice_number: InvoiceNumber::generate(Utc::now()),
                details: details(5),
                send: false,
                occurred_at: Utc::now(),
            }),
            empty_invoice,
        )
        .unwrap();
    invoice_id
}

fn revise(dispatcher: &Dispatcher, invoice_id: InvoiceId) {
    dispatcher
        .dispatch(
            invoice_id.0,
            INVOICE_AGGREGATE,
            InvoiceCommand::ReviseInvoice(ReviseInvoice {
                invoice_id,
                details: details(5),
                occurred_at: Utc::now(),
            }),
            empty_invoice,
        )
        .unwrap();
}

fn bench_command_execution_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_execution_latency");

    group.bench_function("create_invoice_fresh", |b| {
        let dispatcher = dispatcher();
        b.iter(|| black_box(create(&dispatcher)));
    });

    group.bench_function("revise_invoice_with_history", |b| {
        let dispatcher = dispatcher();
        let invoice_id = create(&dispatcher);
        for _ in 0..20 {
            revise(&dispatcher, invoice_id);
        }
        b.iter(|| revise(&dispatcher, black_box(invoice_id)));
    });

    group.finish();
}

fn bench_rehydration(c: &mut Criterion) {
    let mut group = c.benchmark_group("rehydration");

    for event_count in [10usize, 100, 500].iter() {
        let dispatcher = dispatcher();
        let invoice_id = create(&dispatcher);
        for _ in 1..*event_count {
            revise(&dispatcher, invoice_id);
        }

        group.throughput(Throughput::Elements(*event_count as u64));
        group.bench_with_input(
            BenchmarkId::new("load_invoice", event_count),
            event_count,
            |b, _| {
                b.iter(|| {
                    dispatcher
                        .load(black_box(invoice_id.0), INVOICE_AGGREGATE, empty_invoice)
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_calculators(c: &mut Criterion) {
    let mut group = c.benchmark_group("calculators");

    group.bench_function("amount_to_words", |b| {
        b.iter(|| amount_to_words(black_box(dec!(987654321012.34))).unwrap())
    });

    let terms = LoanTerms::new(dec!(350000), dec!(6.25), 360).unwrap();
    group.bench_function("amortized_payment_30y", |b| {
        b.iter(|| amortized_payment(black_box(&terms)).unwrap())
    });

    for item_count in [10usize, 100, 1000].iter() {
        let line_items = items(*item_count);
        group.throughput(Throughput::Elements(*item_count as u64));
        group.bench_with_input(
            BenchmarkId::new("invoice_totals", item_count),
            &line_items,
            |b, line_items| b.iter(|| compute_invoice_totals(black_box(line_items), dec!(8.875)).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_command_execution_latency,
    bench_rehydration,
    bench_calculators
);
criterion_main!(benches);
