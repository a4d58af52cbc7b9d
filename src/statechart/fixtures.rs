//! Charts shared by unit tests across the crate

use super::{ChartBuilder, StateChart, Transition};

/// Top region with leaves `A` (initial) and `B`, and `A --evt1--> B`
pub(crate) fn flat() -> StateChart {
    let mut b = ChartBuilder::new("flat");
    let top = b.top_region();
    let a = b.state(top, "A");
    let bb = b.state(top, "B");
    b.initial(top, a).unwrap();
    b.exit(a, "a_ex()");
    b.entry(bb, "b_en()");
    b.transition(Transition::new(a, bb).with_label("evt1").with_action("t1()"));
    b.build()
}

/// Composite `S` (leaves `S1` initial, `S2`) next to leaf `F`
pub(crate) fn nested() -> StateChart {
    let mut b = ChartBuilder::new("nested");
    let top = b.top_region();
    let s = b.state(top, "S");
    let f = b.state(top, "F");
    let inner = b.region(s);
    let s1 = b.state(inner, "S1");
    let s2 = b.state(inner, "S2");
    b.initial(top, s).unwrap();
    b.initial(inner, s1).unwrap();
    b.entry(s, "s_en()");
    b.exit(s, "s_ex()");
    b.entry(s1, "s1_en()");
    b.exit(s1, "s1_ex()");
    b.entry(s2, "s2_en()");
    b.entry(f, "f_en()");
    b.transition(Transition::new(s1, s2).with_label("e"));
    b.transition(
        Transition::new(s, f)
            .with_label("leave")
            .with_action("bye()"),
    );
    b.build()
}

/// `Idle` next to orthogonal `O`:
/// `O[1]` holds `A1`, `B1`; `O[2]` holds `A2` and composite `C2` (`C21`, `C22`)
pub(crate) fn orthogonal() -> StateChart {
    let mut b = ChartBuilder::new("ortho");
    let top = b.top_region();
    let idle = b.state(top, "Idle");
    let o = b.state(top, "O");
    let r1 = b.region(o);
    let r2 = b.region(o);
    let a1 = b.state(r1, "A1");
    let b1 = b.state(r1, "B1");
    let a2 = b.state(r2, "A2");
    let c2 = b.state(r2, "C2");
    let inner = b.region(c2);
    let c21 = b.state(inner, "C21");
    let _c22 = b.state(inner, "C22");
    b.initial(top, idle).unwrap();
    b.initial(r1, a1).unwrap();
    b.initial(r2, a2).unwrap();
    b.initial(inner, c21).unwrap();
    b.transition(Transition::new(idle, o).with_label("start"));
    b.transition(Transition::new(a1, b1).with_label("a"));
    b.transition(Transition::new(a2, c21).with_label("b"));
    b.build()
}
