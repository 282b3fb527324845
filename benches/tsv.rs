use divan::{Bencher, black_box};
use deptree::{FieldIndex, TsvReader};

fn main() {
    divan::main();
}

const SENTENCE: &str = "1\tA\ta\tDT\tcurrent=a|next=record\t3\tdet
2\trecord\trecord\tNN\t_\t3\tnn
3\tdate\tdate\tNN\t_\t7\tnsubjpass
4\thas\thave\tVBZ\t_\t7\taux
5\tn't\tnot\tRB\t_\t7\tneg
6\tbeen\tbe\tVBN\t_\t7\tauxpass
7\tset\tset\tVBN\t_\t0\troot
";

/// Read a treebank of repeated sentences from memory
#[divan::bench(args = [100, 1000])]
fn read_sentences(bencher: Bencher, count: usize) {
    let text = vec![SENTENCE; count].join("\n");
    bencher.bench_local(|| {
        for result in TsvReader::from_string(black_box(&text), FieldIndex::compact()) {
            black_box(result.unwrap());
        }
    });
}
