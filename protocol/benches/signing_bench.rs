// Digest and signing benchmarks for preconfirmation receipts.
//
// Covers key generation, digest construction, single-digest signing and
// recovery, full receipt issuance at several signer-set sizes, and receipt
// verification.

use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ynx_preconfirm::backend::{
    AtomicHead, Backend, ChainContext, KeccakTxDecoder, MemoryIndexer, MemoryPendingPool,
};
use ynx_preconfirm::crypto::{keccak256, recover_signer, sign_digest, PreconfirmKey};
use ynx_preconfirm::preconfirm::{
    build_digest, verify_receipt, AttestationPayload, AttestationStatus, CancelSignal,
    ReceiptIssuer, SignerSet, VerifyOptions,
};
use ynx_preconfirm::TxHash;

fn payload() -> AttestationPayload {
    AttestationPayload {
        chain_id: "ynx_devnet-1".into(),
        evm_chain_id: 9001,
        tx_hash: TxHash::new([0xaa; 32]),
        status: AttestationStatus::Pending,
        target_block: 1_024,
        issued_at: 1_700_000_000,
    }
}

fn bench_keygen(c: &mut Criterion) {
    c.bench_function("secp256k1/key_generate", |b| {
        b.iter(PreconfirmKey::generate);
    });
}

fn bench_build_digest(c: &mut Criterion) {
    let p = payload();
    c.bench_function("preconfirm/build_digest", |b| {
        b.iter(|| build_digest(&p));
    });
}

fn bench_sign_and_recover(c: &mut Criterion) {
    let key = PreconfirmKey::generate();
    let digest = payload().digest();
    let signature = sign_digest(&key, &digest);

    c.bench_function("secp256k1/sign_digest", |b| {
        b.iter(|| sign_digest(&key, &digest));
    });
    c.bench_function("secp256k1/recover_signer", |b| {
        b.iter(|| recover_signer(&digest, &signature).unwrap());
    });
}

fn bench_issue(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("preconfirm/issue");

    for signers in [1usize, 3, 7] {
        let pool = Arc::new(MemoryPendingPool::new());
        // Put the target at the back of a realistic pool.
        for i in 0..500u32 {
            pool.push(i.to_be_bytes().to_vec());
        }
        let raw = b"bench-target-tx".to_vec();
        let tx = TxHash::new(keccak256(&raw));
        pool.push(raw);

        let backend = Backend::new(
            ChainContext {
                chain_id: "ynx_devnet-1".into(),
                evm_chain_id: 9001,
            },
            Arc::new(MemoryIndexer::new()),
            Arc::new(AtomicHead::new(1_000)),
            pool,
            Arc::new(KeccakTxDecoder),
        );
        let keys = (0..signers).map(|_| PreconfirmKey::generate()).collect();
        let issuer = ReceiptIssuer::new(Some(Arc::new(backend)))
            .with_signers(SignerSet::from_keys(keys, None).unwrap());

        group.throughput(Throughput::Elements(signers as u64));
        group.bench_with_input(BenchmarkId::from_parameter(signers), &tx, |b, tx| {
            b.iter(|| {
                rt.block_on(issuer.issue(*tx, &CancelSignal::never()))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_verify_receipt(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pool = Arc::new(MemoryPendingPool::new());
    let raw = b"verify-target".to_vec();
    let tx = TxHash::new(keccak256(&raw));
    pool.push(raw);
    let backend = Backend::new(
        ChainContext {
            chain_id: "ynx_devnet-1".into(),
            evm_chain_id: 9001,
        },
        Arc::new(MemoryIndexer::new()),
        Arc::new(AtomicHead::new(1)),
        pool,
        Arc::new(KeccakTxDecoder),
    );
    let keys = (0..3).map(|_| PreconfirmKey::generate()).collect();
    let issuer = ReceiptIssuer::new(Some(Arc::new(backend)))
        .with_signers(SignerSet::from_keys(keys, Some(2)).unwrap());
    let receipt = rt
        .block_on(issuer.issue(tx, &CancelSignal::never()))
        .unwrap();
    let opts = VerifyOptions::default();

    c.bench_function("preconfirm/verify_receipt_3_signers", |b| {
        b.iter(|| verify_receipt(&receipt, &opts).unwrap());
    });
}

criterion_group!(
    benches,
    bench_keygen,
    bench_build_digest,
    bench_sign_and_recover,
    bench_issue,
    bench_verify_receipt,
);
criterion_main!(benches);
