//! Hand-authored demo scenarios. Everything here is load-time-immutable;
//! the session only ever reads it.

use crate::{CiStatus, Severity};

use super::{
    CiReport, FileDiff, MemoryHit, MemorySource, Patch, ReviewBundle, ReviewComment, Scenario,
};

pub(super) fn scenarios() -> Vec<Scenario> {
    vec![payments_refund_guard(), search_cache_ttl()]
}

/// Join diff lines into one text block. Context lines keep their leading
/// space prefix, so authoring them as separate strings keeps the prefixes
/// visible.
fn lines(parts: &[&str]) -> String {
    parts.join("\n")
}

/// s1: failing CI, a double-refund hazard, and two review modes that
/// disagree on how opinionated the fix should be.
fn payments_refund_guard() -> Scenario {
    Scenario {
        id: "s1".into(),
        name: "Payments: safer error handling + test fix".into(),
        repo: "acme/payments-api".into(),
        pr_number: 184,
        branch: "feature/refund-safety-guard".into(),
        author: "samuel".into(),
        languages: vec!["TypeScript".into(), "Node.js".into()],
        changed_files: 3,
        additions: 62,
        deletions: 18,
        ci: CiReport {
            status: CiStatus::Failing,
            summary: "1 failing test • 2 lint warnings".into(),
            logs: vec![
                "FAIL  tests/refunds.spec.ts".into(),
                "  ● refunds › should not double-refund when gateway retries".into(),
                "    Expected: 1, Received: 2".into(),
                "".into(),
                "eslint: warning  no-explicit-any  src/refunds/refund.service.ts:41".into(),
                "eslint: warning  prefer-const      src/refunds/refund.service.ts:19".into(),
            ],
        },
        diff: vec![
            FileDiff {
                path: "src/refunds/refund.service.ts".into(),
                hunks: vec![
                    lines(&[
                        "@@ -14,6 +14,22 @@ export async function refundPayment(req: RefundRequest) {",
                        "-  const tx = await db.refunds.create({ data: { paymentId: req.paymentId, amount: req.amount } })",
                        "-  await gateway.refund(req.paymentId, req.amount)",
                        "-  return { ok: true, refundId: tx.id }",
                        "+  const tx = await db.refunds.create({ data: { paymentId: req.paymentId, amount: req.amount } })",
                        "+  await gateway.refund(req.paymentId, req.amount)",
                        "+  return { ok: true, refundId: tx.id }",
                        " }",
                    ]),
                    lines(&[
                        "@@ -35,7 +51,16 @@ export async function refundPayment(req: RefundRequest) {",
                        "-  const existing = await db.refunds.findFirst({ where: { paymentId: req.paymentId } })",
                        "+  const existing: any = await db.refunds.findFirst({ where: { paymentId: req.paymentId } })",
                        "   if (existing) {",
                        "     return { ok: true, refundId: existing.id }",
                        "   }",
                        "+",
                        "+  // TODO: handle gateway retry semantics properly",
                        "+  // NOTE: gateway may retry, ensure idempotency",
                    ]),
                ],
            },
            FileDiff {
                path: "tests/refunds.spec.ts".into(),
                hunks: vec![lines(&[
                    "@@ -22,7 +22,7 @@ it(\"should not double-refund when gateway retries\", async () => {",
                    "-  expect(gateway.refund).toHaveBeenCalledTimes(1)",
                    "+  expect(gateway.refund).toHaveBeenCalledTimes(2)",
                    " })",
                ])],
            },
        ],
        generic: ReviewBundle {
            comments: vec![
                ReviewComment {
                    id: "c1".into(),
                    file_path: "src/refunds/refund.service.ts".into(),
                    line: 35,
                    severity: Severity::Critical,
                    title: "Potential double-refund on gateway retry".into(),
                    message: "Flow calls gateway without an explicit idempotency guard; retries can cause duplicate refunds.".into(),
                    rationale: "Refund endpoints are classic retry surfaces. Idempotency should be explicit before side effects.".into(),
                    risk_score: 86,
                    suggested_patch: Some("p1".into()),
                },
                ReviewComment {
                    id: "c2".into(),
                    file_path: "tests/refunds.spec.ts".into(),
                    line: 22,
                    severity: Severity::Warning,
                    title: "Test asserts double-refund behavior".into(),
                    message: "Spec name says no double-refund but expectation enforces two refunds.".into(),
                    rationale: "Tests should encode intent; this currently institutionalizes the bug.".into(),
                    risk_score: 44,
                    suggested_patch: Some("p2".into()),
                },
                ReviewComment {
                    id: "c3".into(),
                    file_path: "src/refunds/refund.service.ts".into(),
                    line: 51,
                    severity: Severity::Info,
                    title: "Avoid `any` in refund lookup".into(),
                    message: "Using `any` hides contract mismatches. Prefer a typed entity or explicit null handling.".into(),
                    rationale: "Type drift in payment code becomes expensive later.".into(),
                    risk_score: 18,
                    suggested_patch: None,
                },
            ],
            patches: vec![
                Patch {
                    id: "p1".into(),
                    title: "Add idempotency guard for gateway retries".into(),
                    summary: "Prevent double refunds by checking existing refund before side effects.".into(),
                    touches_business_logic: true,
                    unified_diff: lines(&[
                        "diff --git a/src/refunds/refund.service.ts b/src/refunds/refund.service.ts",
                        "index 91a2c11..bb71b5a 100644",
                        "--- a/src/refunds/refund.service.ts",
                        "+++ b/src/refunds/refund.service.ts",
                        "@@ -12,6 +12,23 @@ export async function refundPayment(req: RefundRequest) {",
                        "+  // Idempotency guard: avoid double refunds if gateway retries requests",
                        "+  const existing = await db.refunds.findFirst({ where: { paymentId: req.paymentId } })",
                        "+  if (existing) {",
                        "+    return { ok: true, refundId: existing.id }",
                        "+  }",
                        "+",
                        "   const tx = await db.refunds.create({ data: { paymentId: req.paymentId, amount: req.amount } })",
                        "   await gateway.refund(req.paymentId, req.amount)",
                        "   return { ok: true, refundId: tx.id }",
                        " }",
                    ]),
                },
                Patch {
                    id: "p2".into(),
                    title: "Fix failing test expectation".into(),
                    summary: "Align test with intended behavior: retries should not cause multiple refunds.".into(),
                    touches_business_logic: false,
                    unified_diff: lines(&[
                        "diff --git a/tests/refunds.spec.ts b/tests/refunds.spec.ts",
                        "index 1f2c9ac..e20c9d1 100644",
                        "--- a/tests/refunds.spec.ts",
                        "+++ b/tests/refunds.spec.ts",
                        "@@ -22,7 +22,7 @@ it(\"should not double-refund when gateway retries\", async () => {",
                        "-  expect(gateway.refund).toHaveBeenCalledTimes(2)",
                        "+  expect(gateway.refund).toHaveBeenCalledTimes(1)",
                        " })",
                    ]),
                },
            ],
            memory_hits: vec![],
        },
        with_memory: ReviewBundle {
            comments: vec![
                ReviewComment {
                    id: "c1m".into(),
                    file_path: "src/refunds/refund.service.ts".into(),
                    line: 12,
                    severity: Severity::Critical,
                    title: "Missing idempotency gate (repo standard)".into(),
                    message: "Refund service should enforce the project's idempotency pattern: guard before side effects plus structured log.".into(),
                    rationale: "Matches PR #173 and the refunds README; prevents duplicates under retries and improves incident forensics.".into(),
                    risk_score: 90,
                    suggested_patch: Some("p1m".into()),
                },
                ReviewComment {
                    id: "c2m".into(),
                    file_path: "tests/refunds.spec.ts".into(),
                    line: 22,
                    severity: Severity::Warning,
                    title: "Test contradicts its own intent".into(),
                    message: "Spec name says \"should not double-refund\" but expectation enforces two refunds.".into(),
                    rationale: "Align spec with contract, otherwise you institutionalize the bug.".into(),
                    risk_score: 48,
                    suggested_patch: Some("p2m".into()),
                },
                ReviewComment {
                    id: "c3m".into(),
                    file_path: "src/refunds/refund.service.ts".into(),
                    line: 35,
                    severity: Severity::Info,
                    title: "Remove `any` from money-flow code".into(),
                    message: "Core payment logic should be typed. `any` makes reviews and refactors brittle.".into(),
                    rationale: "Style guide discourages `any` in core services.".into(),
                    risk_score: 22,
                    suggested_patch: None,
                },
            ],
            patches: vec![
                Patch {
                    id: "p1m".into(),
                    title: "Project-standard idempotency gate (early return + log)".into(),
                    summary: "Implements the repo's idempotency pattern with an early return guard plus log on hits.".into(),
                    touches_business_logic: true,
                    unified_diff: lines(&[
                        "diff --git a/src/refunds/refund.service.ts b/src/refunds/refund.service.ts",
                        "index 91a2c11..c2b331a 100644",
                        "--- a/src/refunds/refund.service.ts",
                        "+++ b/src/refunds/refund.service.ts",
                        "@@ -12,6 +12,28 @@ export async function refundPayment(req: RefundRequest) {",
                        "+  // Idempotency (project standard): guard before any side effects",
                        "+  const existing = await db.refunds.findFirst({ where: { paymentId: req.paymentId } })",
                        "+  if (existing) {",
                        "+    logger.info({ paymentId: req.paymentId, refundId: existing.id }, \"refund.idempotent_hit\")",
                        "+    return { ok: true, refundId: existing.id }",
                        "+  }",
                        "+",
                        "   const tx = await db.refunds.create({ data: { paymentId: req.paymentId, amount: req.amount } })",
                        "   await gateway.refund(req.paymentId, req.amount)",
                        "   return { ok: true, refundId: tx.id }",
                        " }",
                    ]),
                },
                Patch {
                    id: "p2m".into(),
                    title: "Restore test intent (no double-refund)".into(),
                    summary: "Makes the spec match the desired contract.".into(),
                    touches_business_logic: false,
                    unified_diff: lines(&[
                        "diff --git a/tests/refunds.spec.ts b/tests/refunds.spec.ts",
                        "index 1f2c9ac..e20c9d1 100644",
                        "--- a/tests/refunds.spec.ts",
                        "+++ b/tests/refunds.spec.ts",
                        "@@ -22,7 +22,7 @@ it(\"should not double-refund when gateway retries\", async () => {",
                        "-  expect(gateway.refund).toHaveBeenCalledTimes(2)",
                        "+  expect(gateway.refund).toHaveBeenCalledTimes(1)",
                        " })",
                    ]),
                },
            ],
            memory_hits: vec![
                MemoryHit {
                    id: "m1".into(),
                    source: MemorySource::StyleGuide,
                    title: "docs/engineering-style.md".into(),
                    snippet: "Prefer early returns for guard clauses. Avoid `any` in core money-flow services.".into(),
                },
                MemoryHit {
                    id: "m2".into(),
                    source: MemorySource::PastPr,
                    title: "PR #173 - Refund idempotency standard".into(),
                    snippet: "Use paymentId as idempotency key; check before side effects; log retry signatures.".into(),
                },
                MemoryHit {
                    id: "m3".into(),
                    source: MemorySource::ModulePattern,
                    title: "src/refunds/README.md".into(),
                    snippet: "Refund service must be deterministic. Side effects only after idempotency gate.".into(),
                },
            ],
        },
    }
}

/// s2: green CI and lower-stakes feedback, including two equal-risk
/// comments on the same file (the risk sort must keep their authored
/// order).
fn search_cache_ttl() -> Scenario {
    Scenario {
        id: "s2".into(),
        name: "Search: cache TTL tuning".into(),
        repo: "acme/search-api".into(),
        pr_number: 207,
        branch: "chore/cache-ttl-tuning".into(),
        author: "priya".into(),
        languages: vec!["Go".into()],
        changed_files: 2,
        additions: 34,
        deletions: 9,
        ci: CiReport {
            status: CiStatus::Passing,
            summary: "All checks passed • 0 warnings".into(),
            logs: vec![
                "ok   internal/cache   0.41s".into(),
                "ok   internal/search  1.02s".into(),
                "govet: no issues found".into(),
            ],
        },
        diff: vec![
            FileDiff {
                path: "internal/cache/ttl.go".into(),
                hunks: vec![
                    lines(&[
                        "@@ -18,9 +18,14 @@ func (c *Cache) Get(key string) ([]byte, bool) {",
                        "-\tentry, ok := c.entries[key]",
                        "-\tif !ok || time.Since(entry.storedAt) > c.ttl {",
                        "-\t\treturn nil, false",
                        "+\tentry, ok := c.entries[key]",
                        "+\tif !ok {",
                        "+\t\treturn nil, false",
                        "+\t}",
                        "+\tif c.clock.Since(entry.storedAt) > c.ttl {",
                        "+\t\tdelete(c.entries, key)",
                        "+\t\treturn nil, false",
                        " \t}",
                    ]),
                    lines(&[
                        "@@ -41,6 +46,7 @@ func (c *Cache) Set(key string, value []byte) {",
                        " \tc.entries[key] = entry{",
                        " \t\tvalue:    value,",
                        "+\t\tstoredAt: c.clock.Now(),",
                        " \t}",
                    ]),
                ],
            },
            FileDiff {
                path: "internal/cache/ttl_test.go".into(),
                hunks: vec![lines(&[
                    "@@ -30,6 +30,18 @@ func TestGetExpired(t *testing.T) {",
                    "+\tclock.Advance(2 * time.Minute)",
                    "+\tif _, ok := cache.Get(\"q\"); ok {",
                    "+\t\tt.Fatal(\"expected expired entry to be evicted\")",
                    "+\t}",
                ])],
            },
        ],
        generic: ReviewBundle {
            comments: vec![
                ReviewComment {
                    id: "g1".into(),
                    file_path: "internal/cache/ttl.go".into(),
                    line: 22,
                    severity: Severity::Warning,
                    title: "Expired entries are never evicted".into(),
                    message: "Get now deletes on read, but entries that are never read again stay resident forever.".into(),
                    rationale: "Lazy eviction alone lets a cold key set grow without bound.".into(),
                    risk_score: 55,
                    suggested_patch: Some("q1".into()),
                },
                ReviewComment {
                    id: "g2".into(),
                    file_path: "internal/cache/ttl.go".into(),
                    line: 47,
                    severity: Severity::Info,
                    title: "Name the injected clock's purpose".into(),
                    message: "The injected clock deserves a comment or interface name that signals test intent.".into(),
                    rationale: "Future readers will wonder why time.Now is not used directly.".into(),
                    risk_score: 30,
                    suggested_patch: None,
                },
                ReviewComment {
                    id: "g3".into(),
                    file_path: "internal/cache/ttl.go".into(),
                    line: 19,
                    severity: Severity::Info,
                    title: "Delete on the read path mutates the map".into(),
                    message: "Deleting inside Get turns a read into a write; note this before anyone introduces an RWMutex.".into(),
                    rationale: "A read-write lock split later would make this a silent data race.".into(),
                    risk_score: 30,
                    suggested_patch: None,
                },
            ],
            patches: vec![Patch {
                id: "q1".into(),
                title: "Sweep expired entries on Set".into(),
                summary: "Opportunistically evict expired entries whenever a new one is stored.".into(),
                touches_business_logic: false,
                unified_diff: lines(&[
                    "diff --git a/internal/cache/ttl.go b/internal/cache/ttl.go",
                    "index 3d91a02..7be20c4 100644",
                    "--- a/internal/cache/ttl.go",
                    "+++ b/internal/cache/ttl.go",
                    "@@ -44,6 +44,13 @@ func (c *Cache) Set(key string, value []byte) {",
                    "+\tfor k, e := range c.entries {",
                    "+\t\tif c.clock.Since(e.storedAt) > c.ttl {",
                    "+\t\t\tdelete(c.entries, k)",
                    "+\t\t}",
                    "+\t}",
                    "+",
                    " \tc.entries[key] = entry{",
                ]),
            }],
            memory_hits: vec![],
        },
        with_memory: ReviewBundle {
            comments: vec![
                ReviewComment {
                    id: "g1m".into(),
                    file_path: "internal/cache/ttl.go".into(),
                    line: 22,
                    severity: Severity::Warning,
                    title: "Evict the way the session cache does".into(),
                    message: "internal/session already solved this with a bounded sweep on write; reuse that pattern instead of inventing a new one.".into(),
                    rationale: "Matches the module pattern doc; two eviction strategies in one codebase is one too many.".into(),
                    risk_score: 62,
                    suggested_patch: Some("q1m".into()),
                },
                ReviewComment {
                    id: "g2m".into(),
                    file_path: "internal/cache/ttl_test.go".into(),
                    line: 32,
                    severity: Severity::Info,
                    title: "Use the shared fake clock helper".into(),
                    message: "testutil.Clock exists for exactly this; the local clock duplicates it.".into(),
                    rationale: "Postmortem PM-41 traced a flaky suite to hand-rolled clocks.".into(),
                    risk_score: 35,
                    suggested_patch: None,
                },
                ReviewComment {
                    id: "g3m".into(),
                    file_path: "internal/cache/ttl.go".into(),
                    line: 19,
                    severity: Severity::Info,
                    title: "Document the read-path mutation".into(),
                    message: "Deleting inside Get is fine under the current mutex, but the invariant should be stated where the lock is taken.".into(),
                    rationale: "The locking comment convention comes from the style guide.".into(),
                    risk_score: 35,
                    suggested_patch: None,
                },
            ],
            patches: vec![Patch {
                id: "q1m".into(),
                title: "Reuse the bounded sweep from internal/session".into(),
                summary: "Port the session cache's write-time sweep (cap 8 scans) instead of a new strategy.".into(),
                touches_business_logic: false,
                unified_diff: lines(&[
                    "diff --git a/internal/cache/ttl.go b/internal/cache/ttl.go",
                    "index 3d91a02..91fe772 100644",
                    "--- a/internal/cache/ttl.go",
                    "+++ b/internal/cache/ttl.go",
                    "@@ -44,6 +44,9 @@ func (c *Cache) Set(key string, value []byte) {",
                    "+\t// Same bounded write-time sweep as internal/session/cache.go",
                    "+\tc.sweepExpired(8)",
                    "+",
                    " \tc.entries[key] = entry{",
                ]),
            }],
            memory_hits: vec![
                MemoryHit {
                    id: "n1".into(),
                    source: MemorySource::ModulePattern,
                    title: "internal/session/cache.go".into(),
                    snippet: "Bounded write-time sweep: scan at most 8 entries per Set; never sweep on Get.".into(),
                },
                MemoryHit {
                    id: "n2".into(),
                    source: MemorySource::IncidentPostmortem,
                    title: "PM-41 - Flaky search suite".into(),
                    snippet: "Root cause: hand-rolled fake clocks drifting from testutil.Clock semantics.".into(),
                },
                MemoryHit {
                    id: "n3".into(),
                    source: MemorySource::StyleGuide,
                    title: "docs/go-style.md".into(),
                    snippet: "State lock invariants at the point the lock is acquired, not at the mutation site.".into(),
                },
            ],
        },
    }
}
